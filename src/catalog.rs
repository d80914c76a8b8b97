//! Static service catalog: type aliases and base pricing
//!
//! The catalog is immutable configuration built once at startup and shared
//! by reference into the assignment engine and pricing logic.

use std::collections::HashMap;

/// Immutable lookup tables for service types
#[derive(Debug, Clone)]
pub struct ServiceCatalog {
    base_prices: HashMap<String, u32>,
    aliases: HashMap<String, Vec<String>>,
    default_base_price: u32,
    emergency_multiplier: f64,
}

impl ServiceCatalog {
    /// The standard marketplace catalog
    pub fn standard() -> Self {
        let base_prices = [
            ("Electrician", 399),
            ("Cooking", 249),
            ("Plumber", 349),
            ("Misc", 299),
            ("Cleaning", 249),
            ("Repair", 399),
            ("Painting", 349),
            ("Shifting", 499),
            ("Plumbing", 349),
            ("Electric", 399),
        ]
        .into_iter()
        .map(|(name, price)| (name.to_string(), price))
        .collect();

        // Multiple display labels resolve to the same candidate pool
        let aliases = [
            ("Electric", vec!["Electric", "Electrician"]),
            ("Electrician", vec!["Electric", "Electrician"]),
            ("Plumbing", vec!["Plumbing", "Plumber"]),
            ("Plumber", vec!["Plumbing", "Plumber"]),
            ("Repair", vec!["Repair"]),
            ("Cleaning", vec!["Cleaning"]),
            ("Painting", vec!["Painting"]),
            ("Shifting", vec!["Shifting"]),
            ("Cooking", vec!["Cooking"]),
            ("Misc", vec!["Misc"]),
        ]
        .into_iter()
        .map(|(name, list)| {
            (
                name.to_string(),
                list.into_iter().map(str::to_string).collect(),
            )
        })
        .collect();

        Self {
            base_prices,
            aliases,
            default_base_price: 299,
            emergency_multiplier: 1.5,
        }
    }

    /// Resolve a display label to its candidate pool labels.
    /// Unknown labels resolve to themselves.
    pub fn resolve_aliases(&self, service_type: &str) -> Vec<String> {
        self.aliases
            .get(service_type)
            .cloned()
            .unwrap_or_else(|| vec![service_type.to_string()])
    }

    /// Base price for a service type, falling back to the default
    pub fn base_price(&self, service_type: &str) -> u32 {
        self.base_prices
            .get(service_type)
            .copied()
            .unwrap_or(self.default_base_price)
    }

    /// Quote a booking price: base, with the emergency surcharge applied
    /// and rounded to the nearest whole unit.
    pub fn quote(&self, service_type: &str, is_emergency: bool) -> u32 {
        let base = self.base_price(service_type);
        if is_emergency {
            (f64::from(base) * self.emergency_multiplier).round() as u32
        } else {
            base
        }
    }
}

impl Default for ServiceCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_resolution() {
        let catalog = ServiceCatalog::standard();
        assert_eq!(catalog.resolve_aliases("Electric"), vec!["Electric", "Electrician"]);
        assert_eq!(catalog.resolve_aliases("Plumber"), vec!["Plumbing", "Plumber"]);
        assert_eq!(catalog.resolve_aliases("Cooking"), vec!["Cooking"]);
        // Unknown labels resolve to themselves
        assert_eq!(catalog.resolve_aliases("Gardening"), vec!["Gardening"]);
    }

    #[test]
    fn test_base_prices() {
        let catalog = ServiceCatalog::standard();
        assert_eq!(catalog.base_price("Plumbing"), 349);
        assert_eq!(catalog.base_price("Shifting"), 499);
        assert_eq!(catalog.base_price("Gardening"), 299);
    }

    #[test]
    fn test_emergency_quote_rounds() {
        let catalog = ServiceCatalog::standard();
        assert_eq!(catalog.quote("Plumbing", false), 349);
        // 349 * 1.5 = 523.5 -> 524
        assert_eq!(catalog.quote("Plumbing", true), 524);
        // 299 * 1.5 = 448.5 -> 449 for unknown types
        assert_eq!(catalog.quote("Gardening", true), 449);
    }
}
