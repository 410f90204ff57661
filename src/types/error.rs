use thiserror::Error;

/// Engine configuration defects, reported when an engine is built.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("volume discount needs at least one tier")]
    NoVolumeTiers,

    #[error("volume tier {index} has max {max} below its min {min}")]
    InvertedTier { index: usize, min: u32, max: u32 },

    #[error("volume tier {index} starts at {min} but the previous tier ends at {previous_max}")]
    TierOverlap {
        index: usize,
        min: u32,
        previous_max: u32,
    },

    #[error("volume tier {index} starts at {min}, leaving quantities from {expected} uncovered")]
    TierGap { index: usize, min: u32, expected: u32 },

    #[error("volume tier {index} is unbounded but is not the last tier")]
    UnboundedTierNotLast { index: usize },

    #[error("volume tier {index} is the last tier but has an upper bound")]
    LastTierBounded { index: usize },

    #[error("percentage {value} for '{name}' is outside 0..=100")]
    PercentageOutOfRange { name: String, value: String },

    #[error("at least one display tier is required")]
    NoDisplayTiers,

    #[error("display tier '{label}' must start above the previous tier")]
    DisplayTierOrder { label: String },
}
