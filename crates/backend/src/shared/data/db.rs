use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement,
};
use std::path::Path;

/// Открывает файловую БД (создает каталог и файл при необходимости) и готовит схему
pub async fn initialize_database(db_file: &Path) -> anyhow::Result<DatabaseConnection> {
    if let Some(parent) = db_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let absolute_path = if db_file.is_absolute() {
        db_file.to_path_buf()
    } else {
        std::env::current_dir()?.join(db_file)
    };
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);

    tracing::info!("Opening database: {}", absolute_path.display());
    connect(&db_url).await
}

/// Подключение по URL + bootstrap схемы. `sqlite::memory:` используется в тестах.
pub async fn connect(db_url: &str) -> anyhow::Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(db_url.to_string());
    if db_url.contains(":memory:") {
        // Каждое соединение in-memory - отдельная БД, держим ровно одно
        options.max_connections(1).min_connections(1);
    }
    let conn = Database::connect(options).await?;
    ensure_schema(&conn).await?;
    Ok(conn)
}

const CREATE_AGENT_TABLE: &str = r#"
    CREATE TABLE a001_agent (
        id TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        phone_number TEXT NOT NULL,
        location TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'active',
        telegram TEXT,
        sort_order INTEGER NOT NULL DEFAULT 0,
        category TEXT NOT NULL DEFAULT 'General',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
"#;

const CREATE_PRE_ORDER_TABLE: &str = r#"
    CREATE TABLE a002_pre_order (
        id TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        phone_number TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending',
        notes TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
"#;

/// Ensure required tables exist (minimal schema bootstrap)
pub async fn ensure_schema(conn: &DatabaseConnection) -> anyhow::Result<()> {
    ensure_table(conn, "a001_agent", CREATE_AGENT_TABLE).await?;
    conn.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        "CREATE INDEX IF NOT EXISTS idx_a001_agent_directory ON a001_agent (status, sort_order);"
            .to_string(),
    ))
    .await?;

    ensure_table(conn, "a002_pre_order", CREATE_PRE_ORDER_TABLE).await?;
    Ok(())
}

async fn ensure_table(conn: &DatabaseConnection, table: &str, ddl: &str) -> anyhow::Result<()> {
    let existing = conn
        .query_all(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "SELECT name FROM sqlite_master WHERE type='table' AND name = ?;",
            [table.into()],
        ))
        .await?;

    if existing.is_empty() {
        tracing::info!("Creating {} table", table);
        conn.execute(Statement::from_string(DatabaseBackend::Sqlite, ddl.to_string()))
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn table_names(conn: &DatabaseConnection) -> Vec<String> {
        conn.query_all(Statement::from_string(
            DatabaseBackend::Sqlite,
            "SELECT name FROM sqlite_master WHERE type='table' ORDER BY name;".to_string(),
        ))
        .await
        .unwrap()
        .into_iter()
        .map(|row| row.try_get::<String>("", "name").unwrap())
        .collect()
    }

    #[tokio::test]
    async fn test_connect_creates_schema() {
        let conn = connect("sqlite::memory:").await.unwrap();
        let tables = table_names(&conn).await;
        assert!(tables.contains(&"a001_agent".to_string()));
        assert!(tables.contains(&"a002_pre_order".to_string()));
    }

    #[tokio::test]
    async fn test_ensure_schema_is_idempotent() {
        let conn = connect("sqlite::memory:").await.unwrap();
        ensure_schema(&conn).await.unwrap();
        ensure_schema(&conn).await.unwrap();
        assert_eq!(table_names(&conn).await.len(), 2);
    }
}
