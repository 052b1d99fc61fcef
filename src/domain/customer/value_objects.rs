use serde::{Deserialize, Serialize};

use crate::domain::inventory::ImportInvoice;
use crate::domain::order::Order;

// ============================================================================
// Customer Value Objects
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CustomerRole {
    #[default]
    #[serde(rename = "khachhang")]
    Customer,
    #[serde(rename = "admin")]
    Admin,
}

impl CustomerRole {
    pub fn token(&self) -> &'static str {
        match self {
            CustomerRole::Customer => "khachhang",
            CustomerRole::Admin => "admin",
        }
    }

    /// Unknown roles fall back to a plain customer.
    pub fn from_token(token: &str) -> Self {
        match token {
            "admin" => CustomerRole::Admin,
            _ => CustomerRole::Customer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub code: String,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub role: CustomerRole,
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub import_invoices: Vec<ImportInvoice>,
}

impl Customer {
    pub fn new(
        code: impl Into<String>,
        full_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            full_name: full_name.into(),
            email: email.into(),
            phone: String::new(),
            address: String::new(),
            role: CustomerRole::Customer,
            orders: Vec::new(),
            import_invoices: Vec::new(),
        }
    }

    pub fn with_contact(mut self, phone: impl Into<String>, address: impl Into<String>) -> Self {
        self.phone = phone.into();
        self.address = address.into();
        self
    }

    pub fn as_admin(mut self) -> Self {
        self.role = CustomerRole::Admin;
        self
    }

    pub fn is_admin(&self) -> bool {
        self.role == CustomerRole::Admin
    }

    pub fn find_order(&self, order_code: &str) -> Option<&Order> {
        self.orders.iter().find(|o| o.code == order_code)
    }
}
