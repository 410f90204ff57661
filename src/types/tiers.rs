use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One quantity band of the volume discount. `max: None` is unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeTier {
    pub min: u32,
    #[serde(default)]
    pub max: Option<u32>,
    pub percentage: Decimal,
}

impl VolumeTier {
    #[must_use]
    pub fn new(min: u32, max: Option<u32>, percentage: Decimal) -> Self {
        Self {
            min,
            max,
            percentage,
        }
    }

    #[must_use]
    pub fn contains(&self, quantity: u32) -> bool {
        quantity >= self.min && self.max.map_or(true, |max| quantity <= max)
    }
}

/// Ascending, non-overlapping quantity bands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VolumeTiers(Vec<VolumeTier>);

impl VolumeTiers {
    #[must_use]
    pub fn new(tiers: Vec<VolumeTier>) -> Self {
        Self(tiers)
    }

    /// Smallest quantity that earns any discount.
    #[must_use]
    pub fn floor(&self) -> Option<u32> {
        self.0.first().map(|t| t.min)
    }

    /// Percentage for a quantity. Tiers are scanned in ascending order and the
    /// first containing tier wins.
    #[must_use]
    pub fn percentage_for(&self, quantity: u32) -> Option<Decimal> {
        self.0
            .iter()
            .find(|tier| tier.contains(quantity))
            .map(|tier| tier.percentage)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[VolumeTier] {
        &self.0
    }
}

impl Default for VolumeTiers {
    fn default() -> Self {
        Self(vec![
            VolumeTier::new(10, Some(49), Decimal::from(5)),
            VolumeTier::new(50, Some(99), Decimal::from(10)),
            VolumeTier::new(100, None, Decimal::from(15)),
        ])
    }
}

/// Customer group code to percentage-off table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, Decimal>",
    into = "BTreeMap<String, Decimal>"
)]
pub struct SegmentTable(BTreeMap<String, Decimal>);

impl SegmentTable {
    /// Build a table; group codes are stored lowercase.
    #[must_use]
    pub fn new(entries: BTreeMap<String, Decimal>) -> Self {
        Self(
            entries
                .into_iter()
                .map(|(code, pct)| (code.to_ascii_lowercase(), pct))
                .collect(),
        )
    }

    /// Case-insensitive lookup.
    #[must_use]
    pub fn percentage_for(&self, group_code: &str) -> Option<Decimal> {
        self.0.get(&group_code.trim().to_ascii_lowercase()).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl From<BTreeMap<String, Decimal>> for SegmentTable {
    fn from(entries: BTreeMap<String, Decimal>) -> Self {
        Self::new(entries)
    }
}

impl From<SegmentTable> for BTreeMap<String, Decimal> {
    fn from(table: SegmentTable) -> Self {
        table.0
    }
}

impl Default for SegmentTable {
    fn default() -> Self {
        Self::new(BTreeMap::from([
            ("wholesale".to_owned(), Decimal::from(20)),
            ("vip".to_owned(), Decimal::from(15)),
            ("retail".to_owned(), Decimal::from(5)),
        ]))
    }
}

/// A storefront display band for the tiered pricing preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayTier {
    pub label: String,
    pub min: u32,
    #[serde(default)]
    pub max: Option<u32>,
}

impl DisplayTier {
    #[must_use]
    pub fn new(label: &str, min: u32, max: Option<u32>) -> Self {
        Self {
            label: label.to_owned(),
            min,
            max,
        }
    }

    #[must_use]
    pub fn default_set() -> Vec<DisplayTier> {
        vec![
            DisplayTier::new("1-9", 1, Some(9)),
            DisplayTier::new("10-49", 10, Some(49)),
            DisplayTier::new("50-99", 50, Some(99)),
            DisplayTier::new("100+", 100, None),
        ]
    }
}
