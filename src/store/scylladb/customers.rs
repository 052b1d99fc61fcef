use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use scylla::client::session::Session;
use scylla::value::Row;

use crate::domain::customer::{Customer, CustomerRole};
use crate::domain::inventory::ImportInvoice;
use crate::domain::order::Order;
use crate::store::CustomerStore;
use super::lwt_applied;

const SELECT_COLUMNS: &str =
    "SELECT code, full_name, email, phone, address, role, orders, import_invoices FROM customers";

type CustomerRow = (
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);

/// Embedded collections are stored as JSON text; a missing column is an
/// empty list.
fn parse_embedded<T: serde::de::DeserializeOwned>(json: Option<String>) -> Result<Vec<T>> {
    match json {
        Some(json) if !json.trim().is_empty() => Ok(serde_json::from_str(&json)?),
        _ => Ok(Vec::new()),
    }
}

fn customer_from_row(row: CustomerRow) -> Result<Customer> {
    let (code, full_name, email, phone, address, role, orders, import_invoices) = row;

    let orders = parse_embedded(orders)
        .with_context(|| format!("Corrupt order list for customer {}", code))?;
    let import_invoices = parse_embedded(import_invoices)
        .with_context(|| format!("Corrupt import invoices for customer {}", code))?;

    Ok(Customer {
        code,
        full_name: full_name.unwrap_or_default(),
        email: email.unwrap_or_default(),
        phone: phone.unwrap_or_default(),
        address: address.unwrap_or_default(),
        role: role.as_deref().map(CustomerRole::from_token).unwrap_or_default(),
        orders,
        import_invoices,
    })
}

pub struct ScyllaCustomers {
    session: Arc<Session>,
}

impl ScyllaCustomers {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    pub async fn upsert(&self, customer: &Customer) -> Result<()> {
        self.session
            .query_unpaged(
                "INSERT INTO customers (code, full_name, email, phone, address, role, orders, import_invoices)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                (
                    &customer.code,
                    &customer.full_name,
                    &customer.email,
                    &customer.phone,
                    &customer.address,
                    customer.role.token(),
                    serde_json::to_string(&customer.orders)?,
                    serde_json::to_string(&customer.import_invoices)?,
                ),
            )
            .await?;
        Ok(())
    }

    /// Overwrite one embedded JSON column, only if the customer row exists.
    async fn replace_column(&self, code: &str, column: &'static str, json: String) -> Result<bool> {
        let result = self
            .session
            .query_unpaged(
                format!("UPDATE customers SET {} = ? WHERE code = ? IF EXISTS", column),
                (json, code),
            )
            .await?;

        let row = result.into_rows_result()?.maybe_first_row::<Row>()?;
        Ok(lwt_applied(row))
    }
}

#[async_trait]
impl CustomerStore for ScyllaCustomers {
    async fn get_by_code(&self, code: &str) -> Result<Option<Customer>> {
        let result = self
            .session
            .query_unpaged(format!("{} WHERE code = ?", SELECT_COLUMNS), (code,))
            .await?;

        let rows_result = result.into_rows_result()?;
        match rows_result.maybe_first_row::<CustomerRow>()? {
            Some(row) => Ok(Some(customer_from_row(row)?)),
            None => Ok(None),
        }
    }

    // Full table scan; every lookup by order code goes through here.
    async fn list_all(&self) -> Result<Vec<Customer>> {
        let result = self.session.query_unpaged(SELECT_COLUMNS, ()).await?;

        let rows_result = result.into_rows_result()?;
        let mut customers = Vec::new();
        for row in rows_result.rows::<CustomerRow>()? {
            customers.push(customer_from_row(row?)?);
        }

        tracing::debug!(count = customers.len(), "Loaded all customers");
        Ok(customers)
    }

    async fn replace_order_list(&self, code: &str, orders: &[Order]) -> Result<bool> {
        self.replace_column(code, "orders", serde_json::to_string(orders)?).await
    }

    // Read-modify-write of the invoice column; concurrent imports by the same
    // admin can lose one of the invoices.
    async fn push_import_invoice(&self, code: &str, invoice: &ImportInvoice) -> Result<bool> {
        let Some(mut admin) = self.get_by_code(code).await? else {
            return Ok(false);
        };
        admin.import_invoices.push(invoice.clone());

        self.replace_column(code, "import_invoices", serde_json::to_string(&admin.import_invoices)?)
            .await
    }
}
