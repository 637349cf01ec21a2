/// Logging initialisation
pub mod logging;
/// TOML configuration loading and validation
pub mod toml_config;
