use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{ConfigError, DisplayTier, SegmentTable, VolumeTiers};

/// Tables used by the built-in rule variants and the tiered pricing preview.
///
/// Every field has a default, so a JSON document only needs the parts it
/// overrides:
///
/// ```
/// use tariff::EngineConfig;
///
/// let config = EngineConfig::from_json(r#"{"segment_discounts": {"gold": 12}}"#).unwrap();
/// assert!(config.segment_discounts.percentage_for("gold").is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Quantity bands of the volume discount rule.
    pub volume_tiers: VolumeTiers,
    /// Group code to percentage-off table of the customer segment rule.
    pub segment_discounts: SegmentTable,
    /// Bands shown by [`PricingEngine::tiered_pricing`](crate::PricingEngine::tiered_pricing).
    pub display_tiers: Vec<DisplayTier>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            volume_tiers: VolumeTiers::default(),
            segment_discounts: SegmentTable::default(),
            display_tiers: DisplayTier::default_set(),
        }
    }
}

impl EngineConfig {
    /// Parse a JSON configuration document. The result is not validated yet;
    /// [`PricingEngineBuilder::build`](crate::PricingEngineBuilder::build) does that.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Json`](crate::PricingError::Json) for malformed input.
    pub fn from_json(input: &str) -> Result<Self, crate::PricingError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Read a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError`](crate::PricingError) on I/O or JSON failure.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, crate::PricingError> {
        let input = std::fs::read_to_string(path)?;
        Self::from_json(&input)
    }

    /// Check the tables for consistency.
    ///
    /// Volume tiers must be ascending, contiguous and non-overlapping. The
    /// last tier, and only the last, is unbounded. Percentages must lie in `0..=100`.
    /// Display tiers must be non-empty and strictly ascending.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_volume_tiers()?;
        for (code, pct) in self.segment_discounts.iter() {
            check_percentage(code, pct)?;
        }
        self.validate_display_tiers()
    }

    fn validate_volume_tiers(&self) -> Result<(), ConfigError> {
        let tiers = self.volume_tiers.as_slice();
        if tiers.is_empty() {
            return Err(ConfigError::NoVolumeTiers);
        }

        let mut previous_max: Option<u32> = None;
        for (index, tier) in tiers.iter().enumerate() {
            check_percentage(&format!("volume tier {index}"), tier.percentage)?;

            if let Some(max) = tier.max {
                if max < tier.min {
                    return Err(ConfigError::InvertedTier {
                        index,
                        min: tier.min,
                        max,
                    });
                }
            } else if index + 1 != tiers.len() {
                return Err(ConfigError::UnboundedTierNotLast { index });
            }

            if let Some(prev) = previous_max {
                if tier.min <= prev {
                    return Err(ConfigError::TierOverlap {
                        index,
                        min: tier.min,
                        previous_max: prev,
                    });
                }
                let expected = prev.saturating_add(1);
                if tier.min != expected {
                    return Err(ConfigError::TierGap {
                        index,
                        min: tier.min,
                        expected,
                    });
                }
            }
            previous_max = tier.max;
        }

        let last = tiers.len() - 1;
        if tiers[last].max.is_some() {
            return Err(ConfigError::LastTierBounded { index: last });
        }
        Ok(())
    }

    fn validate_display_tiers(&self) -> Result<(), ConfigError> {
        if self.display_tiers.is_empty() {
            return Err(ConfigError::NoDisplayTiers);
        }
        for pair in self.display_tiers.windows(2) {
            if pair[1].min <= pair[0].min {
                return Err(ConfigError::DisplayTierOrder {
                    label: pair[1].label.clone(),
                });
            }
        }
        Ok(())
    }
}

fn check_percentage(name: &str, value: Decimal) -> Result<(), ConfigError> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(ConfigError::PercentageOutOfRange {
            name: name.to_owned(),
            value: value.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VolumeTier;

    fn with_tiers(tiers: Vec<VolumeTier>) -> EngineConfig {
        EngineConfig {
            volume_tiers: VolumeTiers::new(tiers),
            ..EngineConfig::default()
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert_eq!(EngineConfig::default().validate(), Ok(()));
    }

    #[test]
    fn empty_tiers_rejected() {
        assert_eq!(
            with_tiers(vec![]).validate(),
            Err(ConfigError::NoVolumeTiers)
        );
    }

    #[test]
    fn overlapping_tiers_rejected() {
        let config = with_tiers(vec![
            VolumeTier::new(10, Some(49), Decimal::from(5)),
            VolumeTier::new(40, None, Decimal::from(10)),
        ]);
        assert_eq!(
            config.validate(),
            Err(ConfigError::TierOverlap {
                index: 1,
                min: 40,
                previous_max: 49
            })
        );
    }

    #[test]
    fn gapped_tiers_rejected() {
        let config = with_tiers(vec![
            VolumeTier::new(10, Some(49), Decimal::from(5)),
            VolumeTier::new(60, None, Decimal::from(10)),
        ]);
        assert_eq!(
            config.validate(),
            Err(ConfigError::TierGap {
                index: 1,
                min: 60,
                expected: 50
            })
        );
    }

    #[test]
    fn unbounded_tier_must_be_last() {
        let config = with_tiers(vec![
            VolumeTier::new(10, None, Decimal::from(5)),
            VolumeTier::new(50, None, Decimal::from(10)),
        ]);
        assert_eq!(
            config.validate(),
            Err(ConfigError::UnboundedTierNotLast { index: 0 })
        );
    }

    #[test]
    fn last_tier_must_be_unbounded() {
        let config = with_tiers(vec![
            VolumeTier::new(10, Some(49), Decimal::from(5)),
            VolumeTier::new(50, Some(99), Decimal::from(10)),
        ]);
        assert_eq!(
            config.validate(),
            Err(ConfigError::LastTierBounded { index: 1 })
        );
    }

    #[test]
    fn inverted_tier_rejected() {
        let config = with_tiers(vec![VolumeTier::new(10, Some(5), Decimal::from(5))]);
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvertedTier {
                index: 0,
                min: 10,
                max: 5
            })
        );
    }

    #[test]
    fn segment_percentage_out_of_range() {
        let config = EngineConfig::from_json(r#"{"segment_discounts": {"vip": 150}}"#).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::PercentageOutOfRange { name, .. }) if name == "vip"
        ));
    }

    #[test]
    fn display_tiers_must_ascend() {
        let config = EngineConfig {
            display_tiers: vec![
                DisplayTier::new("10+", 10, None),
                DisplayTier::new("1-9", 1, Some(9)),
            ],
            ..EngineConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::DisplayTierOrder {
                label: "1-9".into()
            })
        );
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(
            r#"{"volume_tiers": [{"min": 5, "max": null, "percentage": 3}]}"#,
        )
        .unwrap();
        assert_eq!(config.volume_tiers.floor(), Some(5));
        assert_eq!(config.segment_discounts, SegmentTable::default());
        assert_eq!(config.display_tiers.len(), 4);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            EngineConfig::from_json("{not json"),
            Err(crate::PricingError::Json(_))
        ));
    }
}
