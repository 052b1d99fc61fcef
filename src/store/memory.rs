use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::book::Book;
use crate::domain::customer::Customer;
use crate::domain::inventory::ImportInvoice;
use crate::domain::order::Order;
use super::{CatalogStore, CustomerStore};

/// In-process catalog. Each adjustment holds the write lock, which gives
/// the same per-book atomicity as the database conditional update.
#[derive(Default)]
pub struct InMemoryCatalog {
    books: RwLock<HashMap<String, Book>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn upsert(&self, book: Book) {
        self.books.write().await.insert(book.code.clone(), book);
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn get_by_code(&self, code: &str) -> Result<Option<Book>> {
        Ok(self.books.read().await.get(code).cloned())
    }

    async fn adjust_stock_and_sold(&self, code: &str, delta: i32) -> Result<bool> {
        let mut books = self.books.write().await;
        let Some(book) = books.get_mut(code) else {
            return Ok(false);
        };

        match book.adjusted(delta) {
            Some((in_stock, sold)) => {
                book.in_stock = in_stock;
                book.sold = sold;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn increase_stock(&self, code: &str, quantity: i32) -> Result<bool> {
        let mut books = self.books.write().await;
        let Some(book) = books.get_mut(code) else {
            return Ok(false);
        };

        match book.restocked(quantity) {
            Some(in_stock) => {
                book.in_stock = in_stock;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct InMemoryCustomers {
    customers: RwLock<HashMap<String, Customer>>,
}

impl InMemoryCustomers {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn upsert(&self, customer: Customer) {
        self.customers.write().await.insert(customer.code.clone(), customer);
    }
}

#[async_trait]
impl CustomerStore for InMemoryCustomers {
    async fn get_by_code(&self, code: &str) -> Result<Option<Customer>> {
        Ok(self.customers.read().await.get(code).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Customer>> {
        let mut all: Vec<Customer> = self.customers.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(all)
    }

    async fn replace_order_list(&self, code: &str, orders: &[Order]) -> Result<bool> {
        let mut customers = self.customers.write().await;
        match customers.get_mut(code) {
            Some(customer) => {
                customer.orders = orders.to_vec();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn push_import_invoice(&self, code: &str, invoice: &ImportInvoice) -> Result<bool> {
        let mut customers = self.customers.write().await;
        match customers.get_mut(code) {
            Some(customer) => {
                customer.import_invoices.push(invoice.clone());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_adjust_guards_stock() {
        let catalog = InMemoryCatalog::new();
        catalog.upsert(Book::new("SP1", "Book", 100, 5)).await;

        assert!(catalog.adjust_stock_and_sold("SP1", 5).await.unwrap());
        assert!(!catalog.adjust_stock_and_sold("SP1", 1).await.unwrap());

        let book = catalog.get_by_code("SP1").await.unwrap().unwrap();
        assert_eq!((book.in_stock, book.sold), (0, 5));

        assert!(catalog.adjust_stock_and_sold("SP1", -2).await.unwrap());
        let book = catalog.get_by_code("SP1").await.unwrap().unwrap();
        assert_eq!((book.in_stock, book.sold), (2, 3));
    }

    #[tokio::test]
    async fn test_unknown_book_is_not_adjusted() {
        let catalog = InMemoryCatalog::new();
        assert!(!catalog.adjust_stock_and_sold("NOPE", 1).await.unwrap());
        assert!(!catalog.increase_stock("NOPE", 1).await.unwrap());
    }

    #[tokio::test]
    async fn test_increase_stock() {
        let catalog = InMemoryCatalog::new();
        catalog.upsert(Book::new("SP1", "Book", 100, 1)).await;

        assert!(catalog.increase_stock("SP1", 4).await.unwrap());
        assert!(!catalog.increase_stock("SP1", 0).await.unwrap());
        assert_eq!(catalog.get_by_code("SP1").await.unwrap().unwrap().in_stock, 5);
    }

    #[tokio::test]
    async fn test_increase_stock_rejects_overflow() {
        let catalog = InMemoryCatalog::new();
        catalog.upsert(Book::new("SP1", "Book", 100, 2)).await;

        assert!(!catalog.increase_stock("SP1", i32::MAX).await.unwrap());
        assert_eq!(catalog.get_by_code("SP1").await.unwrap().unwrap().in_stock, 2);
    }

    #[tokio::test]
    async fn test_replace_order_list_requires_customer() {
        let customers = InMemoryCustomers::new();
        assert!(!customers.replace_order_list("KH404", &[]).await.unwrap());

        customers.upsert(Customer::new("KH1", "A", "a@example.com")).await;
        assert!(customers.replace_order_list("KH1", &[]).await.unwrap());
    }
}
