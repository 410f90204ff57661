use thiserror::Error;

use crate::parse::ParseError;
use crate::ConfigError;

/// Unified error type for loading rules and configuration.
///
/// Returned by convenience loaders like
/// [`PricingEngine::from_dsl()`](crate::PricingEngine::from_dsl) and
/// [`EngineConfig::from_file()`](crate::EngineConfig::from_file). Price
/// calculation itself never fails.
#[derive(Debug, Error)]
pub enum PricingError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Serialize(#[from] crate::serial::SerializeError),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Deserialize(#[from] crate::serial::DeserializeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_pass_through() {
        let err = PricingError::from(ConfigError::NoVolumeTiers);
        assert_eq!(err.to_string(), ConfigError::NoVolumeTiers.to_string());
    }

    #[test]
    fn json_errors_are_prefixed() {
        let source = serde_json::from_str::<Vec<u8>>("{").unwrap_err();
        let err = PricingError::from(source);
        assert!(err.to_string().starts_with("invalid JSON: "));
    }
}
