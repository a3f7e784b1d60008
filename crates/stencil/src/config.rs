//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_CAPACITY;

/// Settings for an [`Engine`](crate::Engine).
///
/// Deserializes from any serde format; missing fields take their defaults.
///
/// ```rust
/// use stencil::EngineConfig;
///
/// let config: EngineConfig = serde_json::from_str(r#"{"cache_capacity": 8}"#).unwrap();
/// assert_eq!(config.cache_capacity, 8);
///
/// let config: EngineConfig = serde_json::from_str("{}").unwrap();
/// assert_eq!(config, EngineConfig::default());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Compiled templates kept for reuse. `0` disables caching.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

fn default_cache_capacity() -> usize {
    DEFAULT_CAPACITY
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity_is_one() {
        assert_eq!(EngineConfig::default().cache_capacity, 1);
    }

    #[test]
    fn test_serializes_round_trip() {
        let config = EngineConfig { cache_capacity: 3 };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"cache_capacity":3}"#);
        assert_eq!(serde_json::from_str::<EngineConfig>(&json).unwrap(), config);
    }
}
