use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::errors::OrderError;

/// Accepted payment methods. Serialized with the canonical tokens already
/// present in stored documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "TienMat")]
    Cash,
    #[serde(rename = "ChuyenKhoan")]
    BankTransfer,
}

impl PaymentMethod {
    pub fn token(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "TienMat",
            PaymentMethod::BankTransfer => "ChuyenKhoan",
        }
    }

    /// Maps free-form input onto a payment method, ignoring case, spacing,
    /// punctuation and Vietnamese diacritics ("Tiền mặt", "tien mat" and
    /// "TienMat" are the same thing).
    pub fn normalize(raw: &str) -> Result<Self, OrderError> {
        match fold_key(raw).as_str() {
            "tienmat" | "cash" => Ok(PaymentMethod::Cash),
            "chuyenkhoan" | "banktransfer" | "transfer" => Ok(PaymentMethod::BankTransfer),
            _ => Err(OrderError::InvalidPaymentMethod(raw.to_string())),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for PaymentMethod {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::normalize(s)
    }
}

/// NFD-decompose, drop combining marks, lowercase, keep only ASCII
/// letters and digits. `đ` has no decomposition and is mapped by hand.
fn fold_key(raw: &str) -> String {
    raw.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .map(|c| if c == 'đ' { 'd' } else { c })
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cash_spellings_share_one_token() {
        for raw in ["tien mat", "TienMat", "Tiền mặt", "TIỀN MẶT", "  tien-mat ", "cash"] {
            assert_eq!(PaymentMethod::normalize(raw).unwrap(), PaymentMethod::Cash, "{raw}");
        }
        assert_eq!(PaymentMethod::Cash.token(), "TienMat");
    }

    #[test]
    fn test_bank_transfer_spellings() {
        for raw in ["Chuyển khoản", "chuyen khoan", "ChuyenKhoan", "Bank Transfer"] {
            assert_eq!(PaymentMethod::normalize(raw).unwrap(), PaymentMethod::BankTransfer, "{raw}");
        }
    }

    #[test]
    fn test_decomposed_diacritics_fold() {
        // "Tiền" written with combining marks
        let raw = "Tie\u{0302}\u{0300}n ma\u{0306}\u{0323}t";
        assert_eq!(PaymentMethod::normalize(raw).unwrap(), PaymentMethod::Cash);
    }

    #[test]
    fn test_fold_key() {
        assert_eq!(fold_key("Chuyển khoản"), "chuyenkhoan");
        assert_eq!(fold_key("ĐƯỢC đấy"), "duocday");
        assert_eq!(fold_key("Tiền mặt!"), "tienmat");
    }

    #[test]
    fn test_unknown_method_rejected() {
        let err = PaymentMethod::normalize("credit card").unwrap_err();
        assert!(matches!(err, OrderError::InvalidPaymentMethod(ref raw) if raw == "credit card"));
        assert!(PaymentMethod::normalize("").is_err());
    }

    #[test]
    fn test_serialized_token() {
        assert_eq!(serde_json::to_string(&PaymentMethod::BankTransfer).unwrap(), "\"ChuyenKhoan\"");
    }
}
