use super::EngineConfig;
use std::sync::LazyLock;

const ENGINE_DEFAULTS_JSON: &str = include_str!("../../../../config/engine-defaults.json");

static DEFAULT_CONFIG: LazyLock<EngineConfig> = LazyLock::new(|| {
    serde_json::from_str(ENGINE_DEFAULTS_JSON).expect("embedded engine-defaults.json is valid")
});

/// The built-in configuration shipped with the crate.
pub fn default_config() -> &'static EngineConfig {
    &DEFAULT_CONFIG
}
