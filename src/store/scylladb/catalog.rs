use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use scylla::client::session::Session;
use scylla::value::Row;

use crate::domain::book::Book;
use crate::store::CatalogStore;
use super::lwt_applied;

/// Attempts before a contended stock adjustment gives up.
const MAX_CAS_ATTEMPTS: u32 = 8;

type BookRow = (String, Option<String>, Option<i64>, Option<i32>, Option<i32>);

/// Missing columns read as empty/zero for display purposes.
fn book_from_row(row: BookRow) -> Book {
    let (code, name, price, in_stock, sold) = row;
    Book {
        code,
        name: name.unwrap_or_default(),
        price: price.unwrap_or_default(),
        in_stock: in_stock.unwrap_or_default(),
        sold: sold.unwrap_or_default(),
    }
}

/// A row the CAS update can compare against. A null counter never
/// matches `IF in_stock = ?`, so such rows are not adjustable.
fn adjustable_book(row: BookRow) -> Option<Book> {
    if row.3.is_none() || row.4.is_none() {
        return None;
    }
    Some(book_from_row(row))
}

pub struct ScyllaCatalog {
    session: Arc<Session>,
}

impl ScyllaCatalog {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    pub async fn upsert(&self, book: &Book) -> Result<()> {
        self.session
            .query_unpaged(
                "INSERT INTO books (code, name, price, in_stock, sold) VALUES (?, ?, ?, ?, ?)",
                (&book.code, &book.name, book.price, book.in_stock, book.sold),
            )
            .await?;
        Ok(())
    }

    async fn fetch_row(&self, code: &str) -> Result<Option<BookRow>> {
        let result = self
            .session
            .query_unpaged(
                "SELECT code, name, price, in_stock, sold FROM books WHERE code = ?",
                (code,),
            )
            .await?;

        Ok(result.into_rows_result()?.maybe_first_row::<BookRow>()?)
    }

    /// Current counters for a CAS round. `None` for unknown books and for
    /// rows whose counters are null.
    async fn load_for_update(&self, code: &str) -> Result<Option<Book>> {
        let Some(row) = self.fetch_row(code).await? else {
            return Ok(None);
        };
        let book = adjustable_book(row);
        if book.is_none() {
            tracing::warn!(book_code = %code, "Book row has null stock counters, not adjusting");
        }
        Ok(book)
    }

    /// Compare-and-set on both counters. `false` means another writer got
    /// there first.
    async fn compare_and_set(&self, current: &Book, in_stock: i32, sold: i32) -> Result<bool> {
        let result = self
            .session
            .query_unpaged(
                "UPDATE books SET in_stock = ?, sold = ? WHERE code = ? IF in_stock = ? AND sold = ?",
                (in_stock, sold, &current.code, current.in_stock, current.sold),
            )
            .await?;

        let row = result.into_rows_result()?.maybe_first_row::<Row>()?;
        Ok(lwt_applied(row))
    }
}

#[async_trait]
impl CatalogStore for ScyllaCatalog {
    async fn get_by_code(&self, code: &str) -> Result<Option<Book>> {
        Ok(self.fetch_row(code).await?.map(book_from_row))
    }

    async fn adjust_stock_and_sold(&self, code: &str, delta: i32) -> Result<bool> {
        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let Some(current) = self.load_for_update(code).await? else {
                return Ok(false);
            };
            let Some((in_stock, sold)) = current.adjusted(delta) else {
                return Ok(false);
            };

            if self.compare_and_set(&current, in_stock, sold).await? {
                tracing::debug!(
                    book_code = %code,
                    delta = delta,
                    in_stock = in_stock,
                    sold = sold,
                    "Stock adjusted"
                );
                return Ok(true);
            }

            tracing::debug!(
                book_code = %code,
                attempt = attempt,
                "Stock adjustment lost a race, re-reading"
            );
        }

        bail!(
            "Stock adjustment for {} did not settle after {} attempts",
            code,
            MAX_CAS_ATTEMPTS
        )
    }

    async fn increase_stock(&self, code: &str, quantity: i32) -> Result<bool> {
        // Same CAS loop as an adjustment, but `sold` is left alone.
        for _ in 0..MAX_CAS_ATTEMPTS {
            let Some(current) = self.load_for_update(code).await? else {
                return Ok(false);
            };
            let Some(in_stock) = current.restocked(quantity) else {
                return Ok(false);
            };

            if self.compare_and_set(&current, in_stock, current.sold).await? {
                return Ok(true);
            }
        }

        bail!("Stock-in for {} did not settle after {} attempts", code, MAX_CAS_ATTEMPTS)
    }
}
