//! Application configuration.

use serde::{Deserialize, Serialize};

use crate::dom::Placement;
use crate::error::Result;

/// Settings for the counter demo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Initial count of each counter, in display order. `None` leaves the
    /// attribute off so the element default applies.
    pub counters: Vec<Option<i64>>,

    /// Where the shared counter stylesheet goes in `<head>`.
    pub placement: Placement,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            counters: std::iter::once(None)
                .chain((1..10).map(|i| Some(i * 10)))
                .collect(),
            placement: Placement::Append,
        }
    }
}

impl AppConfig {
    /// Parse a JSON configuration. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn default_matches_the_demo() {
        let config = AppConfig::default();
        assert_eq!(config.counters.len(), 10);
        assert_eq!(config.counters[0], None);
        assert_eq!(config.counters[9], Some(90));
        assert_eq!(config.placement, Placement::Append);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = AppConfig::from_json(r#"{ "placement": "prepend" }"#).unwrap();
        assert_eq!(config.placement, Placement::Prepend);
        assert_eq!(config.counters, AppConfig::default().counters);

        let config = AppConfig::from_json(r#"{ "counters": [5, null] }"#).unwrap();
        assert_eq!(config.counters, vec![Some(5), None]);
    }

    #[test]
    fn invalid_json_is_a_config_error() {
        assert!(matches!(
            AppConfig::from_json(r#"{ "counters": "many" }"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            AppConfig::from_json(r#"{ "theme": "dark" }"#),
            Err(Error::Config(_))
        ));
    }
}
