use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportItem {
    pub book_code: String,
    pub book_name: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub line_total: i64,
}

/// A stock receipt: which books came in, how many, and at what cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportInvoice {
    pub code: String,
    pub import_date: DateTime<Utc>,
    pub total_quantity: i32,
    pub total_amount: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub items: Vec<ImportItem>,
}

impl ImportInvoice {
    /// Builds the invoice and its totals. `None` if a total leaves the
    /// integer range.
    pub fn new(
        code: String,
        import_date: DateTime<Utc>,
        note: Option<String>,
        items: Vec<ImportItem>,
    ) -> Option<Self> {
        let total_quantity = items
            .iter()
            .try_fold(0i32, |acc, i| acc.checked_add(i.quantity))?;
        let total_amount = items
            .iter()
            .try_fold(0i64, |acc, i| acc.checked_add(i.line_total))?;

        Some(Self {
            code,
            import_date,
            total_quantity,
            total_amount,
            note,
            items,
        })
    }
}
