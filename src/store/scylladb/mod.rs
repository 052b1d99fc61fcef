// ============================================================================
// ScyllaDB Storage
// ============================================================================
//
// Tables:
// - books:           one row per catalog entry, stock counters updated via LWT
// - customers:       one row per customer; orders and import invoices are
//                    embedded JSON documents replaced as a whole
// - outbox_messages: pending notifications (see crate::notifications)
//
// ============================================================================

mod catalog;
mod customers;
pub mod schema;

use anyhow::Result;
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use scylla::value::{CqlValue, Row};

use crate::config::AppConfig;

pub use catalog::ScyllaCatalog;
pub use customers::ScyllaCustomers;

/// Connect to the cluster, create the schema if needed and switch to the
/// configured keyspace.
pub async fn connect(config: &AppConfig) -> Result<Session> {
    tracing::info!(nodes = ?config.scylla_nodes, "Connecting to ScyllaDB...");

    let session: Session = SessionBuilder::new()
        .known_nodes(&config.scylla_nodes)
        .build()
        .await?;

    schema::ensure_schema(&session, &config.keyspace, config.replication_factor).await?;

    Ok(session)
}

/// Reads the `[applied]` column of a lightweight-transaction result row.
/// A failed condition also returns the current column values, so the row
/// is read untyped.
fn lwt_applied(row: Option<Row>) -> bool {
    matches!(
        row.and_then(|r| r.columns.into_iter().next()).flatten(),
        Some(CqlValue::Boolean(true))
    )
}
