use anyhow::{bail, Result};
use scylla::client::session::Session;

const TABLES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS books (
        code text PRIMARY KEY,
        name text,
        price bigint,
        in_stock int,
        sold int
    )",
    "CREATE TABLE IF NOT EXISTS customers (
        code text PRIMARY KEY,
        full_name text,
        email text,
        phone text,
        address text,
        role text,
        orders text,
        import_invoices text
    )",
    "CREATE TABLE IF NOT EXISTS outbox_messages (
        id uuid PRIMARY KEY,
        aggregate_id text,
        event_type text,
        payload text,
        created_at timestamp
    )",
];

/// Keyspace names are interpolated into CQL, so only plain identifiers
/// are accepted.
pub fn is_valid_keyspace(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 48
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && name.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
}

pub async fn ensure_schema(session: &Session, keyspace: &str, replication_factor: u32) -> Result<()> {
    if !is_valid_keyspace(keyspace) {
        bail!("Invalid keyspace name: {}", keyspace);
    }

    session
        .query_unpaged(
            format!(
                "CREATE KEYSPACE IF NOT EXISTS {} WITH REPLICATION = \
                 {{'class': 'SimpleStrategy', 'replication_factor': {}}}",
                keyspace, replication_factor
            ),
            (),
        )
        .await?;

    session.use_keyspace(keyspace, false).await?;

    for ddl in TABLES {
        session.query_unpaged(*ddl, ()).await?;
    }

    tracing::info!(keyspace = %keyspace, tables = TABLES.len(), "✅ Schema ready");
    Ok(())
}
