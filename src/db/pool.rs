use crate::config::Config;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection};
use std::time::Duration;

pub type DbPool = DatabaseConnection;

const TABLES: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS users (
        id {pk},
        email VARCHAR(254) NOT NULL UNIQUE,
        username VARCHAR(150) NOT NULL UNIQUE,
        first_name VARCHAR(150) NOT NULL,
        last_name VARCHAR(150) NOT NULL,
        password_hash VARCHAR(255) NOT NULL,
        created_at TIMESTAMP NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS tags (
        id {pk},
        name VARCHAR(150) NOT NULL UNIQUE,
        color VARCHAR(16) NOT NULL UNIQUE,
        slug VARCHAR(150) NOT NULL UNIQUE
    )"#,
    r#"CREATE TABLE IF NOT EXISTS ingredients (
        id {pk},
        name VARCHAR(200) NOT NULL,
        measurement_unit VARCHAR(200) NOT NULL,
        UNIQUE (name, measurement_unit)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS recipes (
        id {pk},
        author_id BIGINT NOT NULL,
        name VARCHAR(200) NOT NULL,
        text TEXT NOT NULL,
        image LONGTEXT NULL,
        cooking_time INT NOT NULL,
        pub_date TIMESTAMP NOT NULL,
        FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE CASCADE
    )"#,
    r#"CREATE TABLE IF NOT EXISTS recipe_ingredients (
        id {pk},
        recipe_id BIGINT NOT NULL,
        ingredient_id BIGINT NOT NULL,
        amount INT NOT NULL,
        UNIQUE (recipe_id, ingredient_id),
        FOREIGN KEY (recipe_id) REFERENCES recipes(id) ON DELETE CASCADE,
        FOREIGN KEY (ingredient_id) REFERENCES ingredients(id) ON DELETE CASCADE
    )"#,
    r#"CREATE TABLE IF NOT EXISTS recipe_tags (
        id {pk},
        recipe_id BIGINT NOT NULL,
        tag_id BIGINT NOT NULL,
        UNIQUE (recipe_id, tag_id),
        FOREIGN KEY (recipe_id) REFERENCES recipes(id) ON DELETE CASCADE,
        FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
    )"#,
    r#"CREATE TABLE IF NOT EXISTS favorite_recipes (
        id {pk},
        user_id BIGINT NOT NULL,
        recipe_id BIGINT NOT NULL,
        UNIQUE (user_id, recipe_id),
        FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
        FOREIGN KEY (recipe_id) REFERENCES recipes(id) ON DELETE CASCADE
    )"#,
    r#"CREATE TABLE IF NOT EXISTS shopping_cart (
        id {pk},
        user_id BIGINT NOT NULL,
        recipe_id BIGINT NOT NULL,
        UNIQUE (user_id, recipe_id),
        FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
        FOREIGN KEY (recipe_id) REFERENCES recipes(id) ON DELETE CASCADE
    )"#,
    // subscriber != author is checked in the service layer: MySQL rejects CHECK
    // constraints on columns that carry ON DELETE actions.
    r#"CREATE TABLE IF NOT EXISTS subscriptions (
        id {pk},
        user_id BIGINT NOT NULL,
        author_id BIGINT NOT NULL,
        UNIQUE (user_id, author_id),
        FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
        FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE CASCADE
    )"#,
];

fn primary_key_column(backend: DatabaseBackend) -> Result<&'static str, anyhow::Error> {
    match backend {
        DatabaseBackend::MySql => Ok("BIGINT AUTO_INCREMENT PRIMARY KEY"),
        DatabaseBackend::Sqlite => Ok("INTEGER PRIMARY KEY AUTOINCREMENT"),
        other => Err(anyhow::anyhow!("Unsupported database backend: {:?}", other)),
    }
}

/// Table definitions for `backend`, in dependency order.
pub fn schema_statements(backend: DatabaseBackend) -> Result<Vec<String>, anyhow::Error> {
    let pk = primary_key_column(backend)?;
    Ok(TABLES
        .iter()
        .map(|table| table.replace("{pk}", pk))
        .collect())
}

pub async fn create_pool(config: &Config) -> Result<DbPool, anyhow::Error> {
    let url = config.database_url();
    let mut options = ConnectOptions::new(url.clone());
    options
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug)
        .connect_timeout(Duration::from_secs(10));

    // An in-memory SQLite database lives exactly as long as its connection.
    if url.starts_with("sqlite:") {
        options.max_connections(1).min_connections(1);
    } else {
        options.max_connections(config.database.max_connections);
    }

    let db = Database::connect(options).await?;
    create_schema(&db).await?;
    Ok(db)
}

pub async fn create_schema(db: &DbPool) -> Result<(), anyhow::Error> {
    let backend = db.get_database_backend();
    for statement in schema_statements(backend)? {
        let stmt = sea_orm::Statement::from_string(backend, statement);
        db.execute(stmt).await?;
    }
    log::info!("Database schema ready ({:?})", backend);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_uses_backend_specific_primary_keys() {
        let mysql = schema_statements(DatabaseBackend::MySql).unwrap();
        let sqlite = schema_statements(DatabaseBackend::Sqlite).unwrap();

        assert_eq!(mysql.len(), sqlite.len());
        assert!(mysql.iter().all(|s| s.contains("AUTO_INCREMENT")));
        assert!(sqlite.iter().all(|s| s.contains("AUTOINCREMENT")));
        assert!(mysql.iter().all(|s| !s.contains("{pk}")));
    }

    #[test]
    fn postgres_is_rejected() {
        assert!(schema_statements(DatabaseBackend::Postgres).is_err());
    }
}
