use crate::adapters::http::{default_relay_templates, sheet_export_url};
use crate::core::session::{
    SearchSettings, SessionState, DEFAULT_MIN_SEARCH_CHARS, DEFAULT_SUGGESTION_LIMIT,
};
use crate::core::ConfigProvider;
use crate::domain::model::{ColumnGroup, FieldSchema, FieldSpec};
use crate::utils::error::{LookupError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_range, validate_relay_template,
    validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 15;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    /// 自訂欄位順序；省略時使用登記表的 22 欄
    pub schema: Option<Vec<FieldSpec>>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    pub spreadsheet_id: Option<String>,
    pub sheet_gid: Option<String>,
    /// Full export URL; takes precedence over `spreadsheet_id`/`sheet_gid`.
    pub endpoint: Option<String>,
    pub timeout_seconds: Option<u64>,
    /// Relay templates containing `{url}`. `None` means the built-in relays,
    /// an empty list means direct only.
    pub relays: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub default_columns: Option<Vec<String>>,
    pub suggestion_limit: Option<usize>,
    pub min_search_chars: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub log_level: Option<String>,
    pub json_logs: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(LookupError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| LookupError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SHEET_ID})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| LookupError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn field_schema(&self) -> Result<FieldSchema> {
        match &self.schema {
            Some(fields) => FieldSchema::new(fields.clone()),
            None => Ok(FieldSchema::registration()),
        }
    }

    pub fn search_settings(&self) -> SearchSettings {
        SearchSettings {
            suggestion_limit: self
                .display
                .suggestion_limit
                .unwrap_or(DEFAULT_SUGGESTION_LIMIT),
            min_search_chars: self
                .display
                .min_search_chars
                .unwrap_or(DEFAULT_MIN_SEARCH_CHARS),
        }
    }

    /// Fresh session for this configuration's schema and display settings.
    pub fn session_state(&self) -> Result<SessionState> {
        let schema = self.field_schema()?;
        // 只保留 schema 內存在的群組欄位
        let groups = ColumnGroup::registration_groups()
            .into_iter()
            .map(|mut group| {
                group.columns.retain(|c| schema.contains(c));
                group
            })
            .filter(|group| !group.columns.is_empty())
            .collect();

        let mut state = SessionState::new(schema, groups, self.search_settings());
        if let Some(columns) = &self.display.default_columns {
            state.set_columns(columns)?;
        }
        Ok(state)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.monitoring.as_ref().and_then(|m| m.log_level.as_deref())
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.json_logs)
            .unwrap_or(false)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        match &self.source.endpoint {
            Some(endpoint) => validate_url("source.endpoint", endpoint)?,
            None => {
                let id = self.source.spreadsheet_id.as_deref().ok_or_else(|| {
                    LookupError::MissingConfigError {
                        field: "source.spreadsheet_id".to_string(),
                    }
                })?;
                validate_non_empty_string("source.spreadsheet_id", id)?;
                let gid = self.source.sheet_gid.as_deref().ok_or_else(|| {
                    LookupError::MissingConfigError {
                        field: "source.sheet_gid".to_string(),
                    }
                })?;
                validate_non_empty_string("source.sheet_gid", gid)?;
            }
        }

        if let Some(timeout) = self.source.timeout_seconds {
            validate_range("source.timeout_seconds", timeout, 1, 300)?;
        }
        for template in self.source.relays.iter().flatten() {
            validate_relay_template("source.relays", template)?;
        }
        if let Some(limit) = self.display.suggestion_limit {
            validate_positive_number("display.suggestion_limit", limit, 1)?;
        }
        if let Some(min_chars) = self.display.min_search_chars {
            validate_positive_number("display.min_search_chars", min_chars, 1)?;
        }

        let schema = self.field_schema()?;
        for column in self.display.default_columns.iter().flatten() {
            if !schema.contains(column) {
                return Err(LookupError::InvalidConfigValueError {
                    field: "display.default_columns".to_string(),
                    value: column.clone(),
                    reason: "Not a schema field".to_string(),
                });
            }
        }

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn export_url(&self) -> String {
        if let Some(endpoint) = &self.source.endpoint {
            return endpoint.clone();
        }
        sheet_export_url(
            self.source.spreadsheet_id.as_deref().unwrap_or_default(),
            self.source.sheet_gid.as_deref().unwrap_or_default(),
        )
    }

    fn relay_templates(&self) -> Vec<String> {
        self.source
            .relays
            .clone()
            .unwrap_or_else(default_relay_templates)
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.source.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_basic_toml_config() {
        let toml_content = r#"
[source]
spreadsheet_id = "abc"
sheet_gid = "7"
timeout_seconds = 5

[display]
default_columns = ["email", "celular"]
suggestion_limit = 5
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        config.validate().unwrap();

        assert_eq!(
            config.export_url(),
            "https://docs.google.com/spreadsheets/d/abc/export?format=csv&gid=7"
        );
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.relay_templates().len(), 2);
        assert_eq!(config.search_settings().suggestion_limit, 5);
        assert_eq!(config.search_settings().min_search_chars, 2);
        assert_eq!(config.field_schema().unwrap().len(), 22);

        let state = config.session_state().unwrap();
        assert_eq!(state.selected_columns(), ["nome", "email", "celular"]);
        assert_eq!(state.groups().len(), 4);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("SHEET_DIRECTORY_TEST_ID", "from-env");

        let config = TomlConfig::from_toml_str(
            r#"
[source]
spreadsheet_id = "${SHEET_DIRECTORY_TEST_ID}"
sheet_gid = "1"
"#,
        )
        .unwrap();

        assert_eq!(config.source.spreadsheet_id.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_custom_schema_and_direct_only() {
        let config = TomlConfig::from_toml_str(
            r#"
[source]
endpoint = "http://localhost:9999/sheet.csv"
relays = []

[[schema]]
key = "name"
label = "Name"
required = true

[[schema]]
key = "phone"
label = "Phone"
"#,
        )
        .unwrap();
        config.validate().unwrap();

        let schema = config.field_schema().unwrap();
        assert_eq!(schema.required_key(), "name");
        assert_eq!(config.export_url(), "http://localhost:9999/sheet.csv");
        assert!(config.relay_templates().is_empty());

        let state = config.session_state().unwrap();
        assert!(state.groups().is_empty());
        assert_eq!(state.selected_columns(), ["name"]);
    }

    #[test]
    fn test_validation_errors() {
        let missing = TomlConfig::from_toml_str("[source]\nsheet_gid = \"1\"\n").unwrap();
        assert!(matches!(
            missing.validate(),
            Err(LookupError::MissingConfigError { .. })
        ));

        let bad_relay = TomlConfig::from_toml_str(
            "[source]\nendpoint = \"https://x.test/a\"\nrelays = [\"https://relay.test/\"]\n",
        )
        .unwrap();
        assert!(bad_relay.validate().is_err());

        let bad_column = TomlConfig::from_toml_str(
            "[source]\nendpoint = \"https://x.test/a\"\n[display]\ndefault_columns = [\"nope\"]\n",
        )
        .unwrap();
        assert!(bad_column.validate().is_err());

        let zero_min_chars = TomlConfig::from_toml_str(
            "[source]\nendpoint = \"https://x.test/a\"\n[display]\nmin_search_chars = 0\n",
        )
        .unwrap();
        assert!(matches!(
            zero_min_chars.validate(),
            Err(LookupError::InvalidConfigValueError { ref field, .. }) if field == "display.min_search_chars"
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[source]\nendpoint = \"https://x.test/a.csv\"\n[monitoring]\nlog_level = \"debug\""
        )
        .unwrap();

        let config = TomlConfig::from_file(file.path()).unwrap();
        assert_eq!(config.log_level(), Some("debug"));
        assert!(!config.json_logs());
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            TomlConfig::from_toml_str("[source"),
            Err(LookupError::ConfigError { .. })
        ));
    }
}
