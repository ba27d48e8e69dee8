/// TOML configuration file and its manager.
pub mod toml_config;
