use crate::db::DbPool;
use crate::entities::{ingredient, tag};
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, Set};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct IngredientFixture {
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Debug, Deserialize)]
pub struct TagFixture {
    pub name: String,
    pub color: String,
    pub slug: String,
}

/// Loads `[{"name": .., "measurement_unit": ..}]`, skipping rows that already exist.
/// Returns the number of inserted ingredients.
pub async fn load_ingredients(db: &DbPool, json: &str) -> Result<usize, anyhow::Error> {
    let fixtures: Vec<IngredientFixture> = serde_json::from_str(json)?;
    let mut inserted = 0;

    for fixture in fixtures {
        let existing = ingredient::Entity::find()
            .filter(
                Condition::all()
                    .add(ingredient::Column::Name.eq(fixture.name.as_str()))
                    .add(ingredient::Column::MeasurementUnit.eq(fixture.measurement_unit.as_str())),
            )
            .one(db)
            .await?;
        if existing.is_some() {
            continue;
        }

        let row = ingredient::ActiveModel {
            name: Set(fixture.name),
            measurement_unit: Set(fixture.measurement_unit),
            ..Default::default()
        };
        ingredient::Entity::insert(row).exec(db).await?;
        inserted += 1;
    }

    log::info!("Loaded {} ingredients", inserted);
    Ok(inserted)
}

/// Loads `[{"name": .., "color": .., "slug": ..}]`, skipping slugs that already exist.
pub async fn load_tags(db: &DbPool, json: &str) -> Result<usize, anyhow::Error> {
    let fixtures: Vec<TagFixture> = serde_json::from_str(json)?;
    let mut inserted = 0;

    for fixture in fixtures {
        let existing = tag::Entity::find()
            .filter(tag::Column::Slug.eq(fixture.slug.as_str()))
            .one(db)
            .await?;
        if existing.is_some() {
            continue;
        }

        let row = tag::ActiveModel {
            name: Set(fixture.name),
            color: Set(fixture.color),
            slug: Set(fixture.slug),
            ..Default::default()
        };
        tag::Entity::insert(row).exec(db).await?;
        inserted += 1;
    }

    log::info!("Loaded {} tags", inserted);
    Ok(inserted)
}

/// Loads whichever fixture files are configured.
pub async fn load_configured_fixtures(
    db: &DbPool,
    fixtures: &crate::config::FixtureConfig,
) -> Result<(), anyhow::Error> {
    if let Some(path) = &fixtures.ingredients {
        let json = std::fs::read_to_string(path)?;
        load_ingredients(db, &json).await?;
    }
    if let Some(path) = &fixtures.tags {
        let json = std::fs::read_to_string(path)?;
        load_tags(db, &json).await?;
    }
    Ok(())
}
