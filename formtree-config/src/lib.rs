//! formtree settings using Figment
//!
//! Field rendering needs a handful of names that differ between deployments:
//! the remote endpoints used for related data, the default view type and the
//! generic template fallbacks. This crate loads them with a clear precedence:
//!
//! defaults → `formtree.{toml,yaml,yml,json}` → `FORMTREE_*` environment variables
//!
//! ```no_run
//! use formtree_config::SettingsProvider;
//!
//! let settings = SettingsProvider::with_directory(".").load()?;
//! println!("related data from {}", settings.related_endpoint);
//! # Ok::<(), formtree_config::ConfigError>(())
//! ```

pub mod error;
pub mod provider;
pub mod settings;

pub use error::ConfigError;
pub use provider::SettingsProvider;
pub use settings::{
    FormSettings, DEFAULT_FALLBACK_INPUT_TYPE, DEFAULT_QUERY_BUILDER_ENDPOINT,
    DEFAULT_RELATED_ENDPOINT, DEFAULT_VIEW_TYPE, DEFAULT_WRAPPER,
};

/// Result type for settings operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Load settings from defaults and the environment only
pub fn load_settings() -> ConfigResult<FormSettings> {
    SettingsProvider::new().load()
}
