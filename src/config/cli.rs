use crate::config::toml_config::TomlConfig;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "sheet-directory")]
#[command(about = "Look up records in a publicly shared spreadsheet")]
pub struct CliConfig {
    #[arg(long, short, help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "SHEET_DIRECTORY_SPREADSHEET_ID")]
    pub spreadsheet_id: Option<String>,

    #[arg(long, env = "SHEET_DIRECTORY_SHEET_GID")]
    pub sheet_gid: Option<String>,

    #[arg(long, help = "Full CSV export URL (overrides spreadsheet id and gid)")]
    pub endpoint: Option<String>,

    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    #[arg(long, help = "Only try the direct request, no relays")]
    pub no_relays: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List the first records of the directory
    List,
    /// Suggest records whose name contains TERM
    Search { term: String },
    /// Show the selected fields of one record
    Show {
        name: String,
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
        #[arg(long)]
        group: Option<String>,
        #[arg(long)]
        all: bool,
        #[arg(long, help = "Print the whole record as JSON")]
        json: bool,
    },
    /// Print one raw field value, e.g. for piping to a clipboard tool
    Get { name: String, field: String },
    /// Write records as CSV or TSV to stdout
    Export {
        #[arg(long, default_value = "csv")]
        format: String,
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
    },
    /// List the schema fields and column groups
    Fields,
}

impl CliConfig {
    /// Config file (if any) with command-line flags layered on top.
    pub fn resolve(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };

        if let Some(id) = &self.spreadsheet_id {
            config.source.spreadsheet_id = Some(id.clone());
        }
        if let Some(gid) = &self.sheet_gid {
            config.source.sheet_gid = Some(gid.clone());
        }
        if let Some(endpoint) = &self.endpoint {
            config.source.endpoint = Some(endpoint.clone());
        }
        if let Some(timeout) = self.timeout_seconds {
            config.source.timeout_seconds = Some(timeout);
        }
        if self.no_relays {
            config.source.relays = Some(Vec::new());
        }

        config.validate()?;
        Ok(config)
    }
}
