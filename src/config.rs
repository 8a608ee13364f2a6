use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub database: DatabaseConfig,
    pub pagination: PaginationConfig,
    pub fixtures: FixtureConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Full connection URL. Takes precedence over the discrete MySQL settings.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaginationConfig {
    pub page_size: u64,
    pub max_page_size: u64,
}

/// Paths to JSON reference data loaded at startup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixtureConfig {
    pub ingredients: Option<String>,
    pub tags: Option<String>,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenv::dotenv().ok();

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env_or("SERVER_PORT", 8080),
            },
            jwt: JwtConfig {
                secret: env::var("JWT_SECRET")
                    .unwrap_or_else(|_| "your-secret-key-change-this".to_string()),
                expiration_hours: env_or("JWT_EXPIRATION_HOURS", 24),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").ok(),
                host: env::var("MYSQL_HOST").unwrap_or_else(|_| "localhost".to_string()),
                port: env_or("MYSQL_PORT", 3306),
                user: env::var("MYSQL_USER").unwrap_or_else(|_| "root".to_string()),
                password: env::var("MYSQL_PASSWORD").unwrap_or_else(|_| "password".to_string()),
                database: env::var("MYSQL_DATABASE").unwrap_or_else(|_| "recipes".to_string()),
                max_connections: env_or("DATABASE_MAX_CONNECTIONS", 10),
            },
            pagination: PaginationConfig {
                page_size: env_or("PAGE_SIZE", 6),
                max_page_size: env_or("MAX_PAGE_SIZE", 100),
            },
            fixtures: FixtureConfig {
                ingredients: env::var("INGREDIENTS_FIXTURE").ok(),
                tags: env::var("TAGS_FIXTURE").ok(),
            },
        })
    }

    pub fn database_url(&self) -> String {
        if let Some(url) = &self.database.url {
            return url.clone();
        }
        format!(
            "mysql://{}:{}@{}:{}/{}",
            self.database.user,
            self.database.password,
            self.database.host,
            self.database.port,
            self.database.database
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_url_wins_over_mysql_settings() {
        let mut config = Config::from_env().unwrap();
        config.database.url = Some("sqlite::memory:".to_string());
        assert_eq!(config.database_url(), "sqlite::memory:");

        config.database.url = None;
        config.database.user = "chef".to_string();
        config.database.password = "secret".to_string();
        config.database.host = "db".to_string();
        config.database.port = 3307;
        config.database.database = "kitchen".to_string();
        assert_eq!(config.database_url(), "mysql://chef:secret@db:3307/kitchen");
    }
}
