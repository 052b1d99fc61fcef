use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::customer::Customer;
use crate::domain::inventory::{ImportInvoice, ImportItem, InventoryError};
use crate::store::{CatalogStore, CustomerStore};
use super::codes::CodeGenerator;
use super::order_service::DEFAULT_MAX_PAGE_SIZE;
use super::pagination::{paginate, Page, PageRequest};

// ============================================================================
// Inventory Service - stock receipts recorded by admins
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportLineRequest {
    pub book_code: String,
    pub quantity: i32,
    pub unit_price: i64,
}

pub struct InventoryService {
    catalog: Arc<dyn CatalogStore>,
    customers: Arc<dyn CustomerStore>,
    invoice_codes: CodeGenerator,
    max_page_size: u32,
}

impl InventoryService {
    pub fn new(catalog: Arc<dyn CatalogStore>, customers: Arc<dyn CustomerStore>) -> Self {
        Self {
            catalog,
            customers,
            invoice_codes: CodeGenerator::new("PN"),
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }

    pub fn with_max_page_size(mut self, max_page_size: u32) -> Self {
        self.max_page_size = max_page_size;
        self
    }

    /// Add units to a single book without an invoice.
    pub async fn stock_in(&self, book_code: &str, quantity: i32) -> Result<(), InventoryError> {
        if quantity <= 0 {
            return Err(InventoryError::InvalidQuantity {
                book_code: book_code.to_string(),
                quantity,
            });
        }

        if !self.catalog.increase_stock(book_code, quantity).await? {
            // Either the book is gone or the counter would overflow.
            return Err(match self.catalog.get_by_code(book_code).await? {
                None => InventoryError::BookNotFound(book_code.to_string()),
                Some(_) => InventoryError::InvalidQuantity {
                    book_code: book_code.to_string(),
                    quantity,
                },
            });
        }

        tracing::info!(book_code = %book_code, quantity = quantity, "Stock received");
        Ok(())
    }

    /// Record an import invoice for `admin_code` and add every line to stock.
    ///
    /// All lines are validated before any stock moves. Once stock has been
    /// increased it is not rolled back if the invoice write fails.
    pub async fn create_import_invoice(
        &self,
        admin_code: &str,
        lines: Vec<ImportLineRequest>,
        note: Option<String>,
    ) -> Result<String, InventoryError> {
        let admin = self.load_admin(admin_code).await?;

        if lines.is_empty() {
            return Err(InventoryError::EmptyItems);
        }

        // Stock each book would end up with; repeated lines accumulate.
        let mut projected: HashMap<String, i32> = HashMap::new();
        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            let book = self
                .catalog
                .get_by_code(&line.book_code)
                .await?
                .ok_or_else(|| InventoryError::BookNotFound(line.book_code.clone()))?;

            let stock = projected.entry(book.code.clone()).or_insert(book.in_stock);
            let next = if line.quantity > 0 {
                stock.checked_add(line.quantity)
            } else {
                None
            };
            let Some(next) = next else {
                return Err(InventoryError::InvalidQuantity {
                    book_code: line.book_code,
                    quantity: line.quantity,
                });
            };
            *stock = next;

            if line.unit_price < 0 {
                return Err(InventoryError::InvalidUnitPrice {
                    book_code: line.book_code,
                    unit_price: line.unit_price,
                });
            }
            let line_total = line
                .unit_price
                .checked_mul(i64::from(line.quantity))
                .ok_or(InventoryError::TotalsOverflow)?;

            items.push(ImportItem {
                line_total,
                book_code: line.book_code,
                book_name: book.name,
                quantity: line.quantity,
                unit_price: line.unit_price,
            });
        }

        let now = Utc::now();
        let invoice = ImportInvoice::new(self.invoice_codes.next(now), now, note, items)
            .ok_or(InventoryError::TotalsOverflow)?;

        for item in &invoice.items {
            if !self.catalog.increase_stock(&item.book_code, item.quantity).await? {
                // changed between validation and now
                tracing::warn!(
                    book_code = %item.book_code,
                    quantity = item.quantity,
                    "Stock not increased during import"
                );
            }
        }

        if !self.customers.push_import_invoice(&admin.code, &invoice).await? {
            tracing::error!(
                admin_code = %admin.code,
                invoice_code = %invoice.code,
                "Stock increased but import invoice was not saved"
            );
            return Err(InventoryError::NotPersisted(admin.code));
        }

        tracing::info!(
            admin_code = %admin.code,
            invoice_code = %invoice.code,
            total_quantity = invoice.total_quantity,
            total_amount = invoice.total_amount,
            "✅ Import invoice recorded"
        );
        Ok(invoice.code)
    }

    /// Invoices recorded by an admin, newest first. Unknown codes and
    /// non-admin customers have none.
    pub async fn list_import_invoices(&self, admin_code: &str) -> Result<Vec<ImportInvoice>, InventoryError> {
        let Some(admin) = self
            .customers
            .get_by_code(admin_code)
            .await?
            .filter(Customer::is_admin)
        else {
            return Ok(Vec::new());
        };

        let mut invoices = admin.import_invoices;
        invoices.sort_by(|a, b| b.import_date.cmp(&a.import_date));
        Ok(invoices)
    }

    pub async fn get_import_invoice(
        &self,
        admin_code: &str,
        invoice_code: &str,
    ) -> Result<Option<ImportInvoice>, InventoryError> {
        Ok(self
            .list_import_invoices(admin_code)
            .await?
            .into_iter()
            .find(|invoice| invoice.code == invoice_code))
    }

    /// Paged import history, optionally limited to `[from, to]`.
    pub async fn import_history(
        &self,
        admin_code: &str,
        page: i64,
        page_size: i64,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Page<ImportInvoice>, InventoryError> {
        let request = PageRequest::clamped(page, page_size, self.max_page_size);

        let invoices: Vec<ImportInvoice> = self
            .list_import_invoices(admin_code)
            .await?
            .into_iter()
            .filter(|invoice| from.map_or(true, |from| invoice.import_date >= from))
            .filter(|invoice| to.map_or(true, |to| invoice.import_date <= to))
            .collect();

        Ok(paginate(invoices, request))
    }

    async fn load_admin(&self, admin_code: &str) -> Result<Customer, InventoryError> {
        match self.customers.get_by_code(admin_code).await? {
            Some(customer) if customer.is_admin() => Ok(customer),
            _ => Err(InventoryError::AdminNotFound(admin_code.to_string())),
        }
    }
}
