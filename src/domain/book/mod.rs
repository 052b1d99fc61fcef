use serde::{Deserialize, Serialize};

/// Catalog entry. `in_stock` and `sold` only move together through a
/// stock adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub code: String,
    pub name: String,
    pub price: i64,
    pub in_stock: i32,
    pub sold: i32,
}

impl Book {
    pub fn new(code: impl Into<String>, name: impl Into<String>, price: i64, in_stock: i32) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            price,
            in_stock,
            sold: 0,
        }
    }

    /// Counters after moving `delta` units from stock to sold.
    ///
    /// A positive delta is a purchase and needs `in_stock >= delta`; a
    /// negative delta gives units back. `None` when the purchase exceeds
    /// stock or either counter would leave the `i32` range.
    pub fn adjusted(&self, delta: i32) -> Option<(i32, i32)> {
        if delta > 0 && self.in_stock < delta {
            return None;
        }
        let in_stock = self.in_stock.checked_sub(delta)?;
        let sold = self.sold.checked_add(delta)?;
        Some((in_stock, sold))
    }

    /// Stock after receiving `quantity` units, leaving `sold` alone.
    pub fn restocked(&self, quantity: i32) -> Option<i32> {
        if quantity <= 0 {
            return None;
        }
        self.in_stock.checked_add(quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purchase_within_stock() {
        let book = Book::new("SP1", "Book", 100, 5);
        assert_eq!(book.adjusted(5), Some((0, 5)));
        assert_eq!(book.adjusted(6), None);
    }

    #[test]
    fn test_return_always_applies() {
        let mut book = Book::new("SP1", "Book", 100, 2);
        book.sold = 3;
        assert_eq!(book.adjusted(-3), Some((5, 0)));
    }

    #[test]
    fn test_counters_never_wrap() {
        let mut book = Book::new("SP1", "Book", 100, i32::MAX);
        book.sold = 1;
        assert_eq!(book.adjusted(-1), None);

        let mut book = Book::new("SP1", "Book", 100, 5);
        book.sold = i32::MAX;
        assert_eq!(book.adjusted(1), None);
        assert_eq!(book.adjusted(i32::MIN), None);
    }

    #[test]
    fn test_restock() {
        let book = Book::new("SP1", "Book", 100, 2);
        assert_eq!(book.restocked(3), Some(5));
        assert_eq!(book.restocked(0), None);
        assert_eq!(book.restocked(i32::MAX), None);
    }
}
