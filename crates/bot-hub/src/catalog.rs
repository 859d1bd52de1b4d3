//! Fixed templates the simulated event stream samples from

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::message::{ActivityEvent, PriceAlertEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityTemplate {
    pub action: &'static str,
    pub details: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductTemplate {
    pub name: &'static str,
    /// Minor currency units
    pub old_price: i64,
    /// Minor currency units
    pub new_price: i64,
}

pub const ACTIVITY_CATALOG: [ActivityTemplate; 4] = [
    ActivityTemplate {
        action: "New user registered",
        details: "@shopper123",
    },
    ActivityTemplate {
        action: "Product search",
        details: "wireless headphones",
    },
    ActivityTemplate {
        action: "Price comparison",
        details: "iPhone 13 vs iPhone 14",
    },
    ActivityTemplate {
        action: "User feedback",
        details: "⭐️⭐️⭐️⭐️⭐️",
    },
];

pub const PRODUCT_CATALOG: [ProductTemplate; 3] = [
    ProductTemplate {
        name: "iPhone 13",
        old_price: 69900,
        new_price: 64900,
    },
    ProductTemplate {
        name: "Sony WH-1000XM4",
        old_price: 28990,
        new_price: 24990,
    },
    ProductTemplate {
        name: "MacBook Air M1",
        old_price: 89900,
        new_price: 84900,
    },
];

/// Percent change from `old_price` to `new_price`, rounded half away from zero.
///
/// `old_price` of zero yields 0 rather than an infinite change.
pub fn percent_change(old_price: i64, new_price: i64) -> i64 {
    if old_price == 0 {
        return 0;
    }
    let change = (new_price - old_price) as f64 / old_price as f64 * 100.0;
    change.round() as i64
}

impl ActivityTemplate {
    pub fn at(&self, timestamp: DateTime<Utc>) -> ActivityEvent {
        ActivityEvent {
            action: self.action.to_string(),
            details: self.details.to_string(),
            timestamp,
        }
    }
}

impl ProductTemplate {
    pub fn difference(&self) -> i64 {
        percent_change(self.old_price, self.new_price)
    }

    pub fn at(&self, timestamp: DateTime<Utc>) -> PriceAlertEvent {
        PriceAlertEvent {
            product: self.name.to_string(),
            old_price: self.old_price,
            new_price: self.new_price,
            difference: self.difference(),
            timestamp,
        }
    }
}

/// Pick an activity uniformly at random and stamp it with the current time
pub fn random_activity<R: Rng + ?Sized>(rng: &mut R) -> ActivityEvent {
    let template = ACTIVITY_CATALOG
        .choose(rng)
        .unwrap_or(&ACTIVITY_CATALOG[0]);
    template.at(Utc::now())
}

/// Pick a product uniformly at random and stamp its price alert with the current time
pub fn random_price_alert<R: Rng + ?Sized>(rng: &mut R) -> PriceAlertEvent {
    let template = PRODUCT_CATALOG
        .choose(rng)
        .unwrap_or(&PRODUCT_CATALOG[0]);
    template.at(Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn percent_change_matches_catalog_prices() {
        assert_eq!(percent_change(69900, 64900), -7);
        assert_eq!(percent_change(28990, 24990), -14);
        assert_eq!(percent_change(89900, 84900), -6);
    }

    #[test]
    fn percent_change_rounds_half_away_from_zero() {
        assert_eq!(percent_change(200, 201), 1); // 0.5
        assert_eq!(percent_change(200, 199), -1); // -0.5
        assert_eq!(percent_change(100, 150), 50);
        assert_eq!(percent_change(0, 100), 0);
    }

    #[test]
    fn activities_come_from_the_catalog() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = HashSet::new();
        for _ in 0..200 {
            let event = random_activity(&mut rng);
            let template = ACTIVITY_CATALOG
                .iter()
                .find(|t| t.action == event.action)
                .expect("action not in catalog");
            assert_eq!(template.details, event.details);
            seen.insert(event.action);
        }
        assert_eq!(seen.len(), ACTIVITY_CATALOG.len());
    }

    #[test]
    fn price_alerts_come_from_the_catalog() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen = HashSet::new();
        for _ in 0..200 {
            let alert = random_price_alert(&mut rng);
            let template = PRODUCT_CATALOG
                .iter()
                .find(|t| t.name == alert.product)
                .expect("product not in catalog");
            assert_eq!(alert.old_price, template.old_price);
            assert_eq!(alert.new_price, template.new_price);
            assert_eq!(
                alert.difference,
                (((alert.new_price - alert.old_price) as f64 / alert.old_price as f64) * 100.0)
                    .round() as i64
            );
            seen.insert(alert.product);
        }
        assert_eq!(seen.len(), PRODUCT_CATALOG.len());
    }
}
