pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};
pub use config::TomlConfig;

pub use adapters::http::{strategies_from_config, DirectStrategy, RelayStrategy};
pub use core::{
    decoder::{decode_document, tokenize_line},
    fetcher::Fetcher,
    loader::{DirectoryLoader, RefreshOutcome},
    session::SessionState,
};
pub use domain::model::{ColumnGroup, FieldSchema, FieldSpec, Record};
pub use utils::error::{LookupError, Result};

/// Wire the HTTP strategies and schema from a configuration into a loader.
pub fn loader_from_config(config: &TomlConfig) -> Result<DirectoryLoader> {
    let strategies = strategies_from_config(config)?;
    let schema = config.field_schema()?;
    Ok(DirectoryLoader::new(Fetcher::new(strategies), schema))
}
