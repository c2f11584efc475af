//! Carrier records and selection.

use serde::{Deserialize, Serialize};

/// A shipping carrier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Carrier {
    /// Short carrier code used on events (e.g. `FEDEX`).
    pub code: String,

    /// Display name.
    pub name: String,

    /// Tracking URL with a `{tracking}` placeholder.
    pub tracking_url_template: String,

    /// Whether the carrier can currently be assigned shipments.
    pub active: bool,

    /// Selection priority, lower wins.
    pub priority: u32,
}

impl Carrier {
    /// Creates a carrier record.
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        tracking_url_template: impl Into<String>,
        active: bool,
        priority: u32,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            tracking_url_template: tracking_url_template.into(),
            active,
            priority,
        }
    }

    /// Renders the tracking URL for a tracking number.
    pub fn tracking_url(&self, tracking_number: &str) -> String {
        self.tracking_url_template
            .replace("{tracking}", tracking_number)
    }
}

/// Configured carriers, consulted when a shipment is created.
#[derive(Debug, Clone, Default)]
pub struct CarrierDirectory {
    carriers: Vec<Carrier>,
}

/// Carrier code assigned when no active carrier is configured.
pub const FALLBACK_CARRIER: &str = "FEDEX";

impl CarrierDirectory {
    /// Creates a directory over the given carriers.
    pub fn new(carriers: Vec<Carrier>) -> Self {
        Self { carriers }
    }

    /// A directory seeded with the standard carriers.
    pub fn standard() -> Self {
        Self::new(vec![
            Carrier::new(
                "FEDEX",
                "FedEx",
                "https://www.fedex.com/track?tracknumbers={tracking}",
                true,
                1,
            ),
            Carrier::new(
                "UPS",
                "UPS",
                "https://www.ups.com/track?tracknum={tracking}",
                true,
                2,
            ),
            Carrier::new(
                "DHL",
                "DHL",
                "https://www.dhl.com/track?id={tracking}",
                false,
                3,
            ),
        ])
    }

    /// Picks the active carrier with the lowest priority; insertion order
    /// breaks ties, so selection is deterministic.
    pub fn first_active(&self) -> Option<&Carrier> {
        self.carriers
            .iter()
            .filter(|c| c.active)
            .min_by_key(|c| c.priority)
    }

    /// Carrier code to assign to a new shipment.
    pub fn select_code(&self) -> String {
        self.first_active()
            .map(|c| c.code.clone())
            .unwrap_or_else(|| FALLBACK_CARRIER.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_prefers_lowest_priority_active() {
        let directory = CarrierDirectory::new(vec![
            Carrier::new("DHL", "DHL", "u", true, 3),
            Carrier::new("UPS", "UPS", "u", true, 2),
            Carrier::new("FEDEX", "FedEx", "u", false, 1),
        ]);
        assert_eq!(directory.select_code(), "UPS");
    }

    #[test]
    fn insertion_order_breaks_priority_ties() {
        let directory = CarrierDirectory::new(vec![
            Carrier::new("UPS", "UPS", "u", true, 1),
            Carrier::new("DHL", "DHL", "u", true, 1),
        ]);
        assert_eq!(directory.select_code(), "UPS");
    }

    #[test]
    fn empty_directory_falls_back() {
        assert_eq!(CarrierDirectory::default().select_code(), FALLBACK_CARRIER);
    }

    #[test]
    fn tracking_url_substitution() {
        let carrier = Carrier::new("X", "X", "https://x.example/{tracking}", true, 1);
        assert_eq!(carrier.tracking_url("TRK-1"), "https://x.example/TRK-1");
    }
}
