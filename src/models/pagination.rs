use crate::config::PaginationConfig;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PageQuery {
    #[schema(example = 1)]
    pub page: Option<u64>,
    #[schema(example = 6)]
    pub limit: Option<u64>,
}

/// A resolved 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    pub fn resolve(page: Option<u64>, limit: Option<u64>, config: &PaginationConfig) -> Self {
        let max = config.max_page_size.max(1);
        PageRequest {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(config.page_size).clamp(1, max),
        }
    }

    /// Zero-based index, as expected by SeaORM paginators.
    pub fn index(&self) -> u64 {
        self.page - 1
    }
}

impl PageQuery {
    pub fn resolve(&self, config: &PaginationConfig) -> PageRequest {
        PageRequest::resolve(self.page, self.limit, config)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<u64>,
    pub previous: Option<u64>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(results: Vec<T>, count: u64, request: PageRequest) -> Self {
        let pages = count.div_ceil(request.limit);
        Page {
            count,
            next: (request.page < pages).then_some(request.page + 1),
            previous: (request.page > 1).then(|| (request.page - 1).min(pages.max(1))),
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PaginationConfig {
        PaginationConfig {
            page_size: 6,
            max_page_size: 50,
        }
    }

    #[test]
    fn defaults_and_clamping() {
        let request = PageRequest::resolve(None, None, &config());
        assert_eq!(request, PageRequest { page: 1, limit: 6 });

        let request = PageRequest::resolve(Some(0), Some(500), &config());
        assert_eq!(request, PageRequest { page: 1, limit: 50 });

        let request = PageRequest::resolve(Some(3), Some(0), &config());
        assert_eq!(request, PageRequest { page: 3, limit: 1 });
        assert_eq!(request.index(), 2);
    }

    #[test]
    fn neighbours_follow_item_count() {
        let middle = Page::new(vec![1, 2], 5, PageRequest { page: 2, limit: 2 });
        assert_eq!(middle.next, Some(3));
        assert_eq!(middle.previous, Some(1));

        let last = Page::new(vec![5], 5, PageRequest { page: 3, limit: 2 });
        assert_eq!(last.next, None);
        assert_eq!(last.previous, Some(2));

        let empty = Page::<i32>::new(vec![], 0, PageRequest { page: 1, limit: 6 });
        assert_eq!(empty.next, None);
        assert_eq!(empty.previous, None);
    }
}
