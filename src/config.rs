use config::{Config, ConfigError, File as ConfigFile};
use serde::Deserialize;

/// Immutable description of one depot root: how many shard-directory levels
/// it uses and whether it participates in verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DepotInformation {
    pub depth: usize,
    pub is_active: bool,
}

impl Default for DepotInformation {
    fn default() -> Self {
        Self {
            depth: 4,
            is_active: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Propagate the first parse/write failure instead of skipping the
    /// offending input and letting siblings proceed.
    #[serde(default)]
    pub strict: bool,

    #[serde(default)]
    pub depot: DepotInformation,
}

pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depot_defaults() {
        let depot = DepotInformation::default();
        assert_eq!(depot.depth, 4);
        assert!(depot.is_active);
    }

    #[test]
    fn config_defaults_are_lenient() {
        let config = AppConfig::default();
        assert!(!config.strict);
    }
}
