//! Customer details carried on order events.

use serde::{Deserialize, Serialize};

/// Customer contact and shipping details as declared on the order.
///
/// Carried inside order-created and order-confirmed events so downstream
/// services never reach back into the orders service's storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    /// Customer's first name.
    pub first_name: String,

    /// Customer's last name.
    pub last_name: String,

    /// Email address notifications are delivered to.
    pub email: String,

    /// Street address line.
    pub street: String,

    /// City.
    pub city: String,

    /// Postal / ZIP code.
    pub postal_code: String,

    /// Country.
    pub country: String,
}

impl CustomerInfo {
    /// Returns the customer's full display name.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Returns the full shipping address on a single line.
    pub fn full_address(&self) -> String {
        format!(
            "{}, {} {}, {}",
            self.street, self.postal_code, self.city, self.country
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CustomerInfo {
        CustomerInfo {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            street: "12 Analytical Way".to_string(),
            city: "London".to_string(),
            postal_code: "EC1A".to_string(),
            country: "UK".to_string(),
        }
    }

    #[test]
    fn full_name_joins_first_and_last() {
        assert_eq!(sample().full_name(), "Ada Lovelace");
    }

    #[test]
    fn full_address_is_single_line() {
        assert_eq!(sample().full_address(), "12 Analytical Way, EC1A London, UK");
    }

    #[test]
    fn serialization_roundtrip() {
        let info = sample();
        let json = serde_json::to_string(&info).unwrap();
        let deserialized: CustomerInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(info, deserialized);
    }
}
