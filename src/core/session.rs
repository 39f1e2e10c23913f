use crate::domain::model::{ColumnGroup, FieldSchema, Record};
use crate::utils::error::{LookupError, Result};
use chrono::{DateTime, Local};
use std::collections::HashMap;

pub const DEFAULT_COLUMNS: [&str; 4] = ["nome", "email", "cpf", "celular"];
pub const DEFAULT_SUGGESTION_LIMIT: usize = 10;
pub const DEFAULT_MIN_SEARCH_CHARS: usize = 2;
pub const PREVIEW_LIMIT: usize = 12;

/// Placeholder shown for an empty value.
pub const EMPTY_VALUE: &str = "-";

#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub suggestion_limit: usize,
    pub min_search_chars: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
            min_search_chars: DEFAULT_MIN_SEARCH_CHARS,
        }
    }
}

/// Everything the presentation layer keeps between interactions.
///
/// Records added with [`add_record`](Self::add_record) live only here and are
/// gone after the next successful load.
#[derive(Debug, Clone)]
pub struct SessionState {
    schema: FieldSchema,
    groups: Vec<ColumnGroup>,
    settings: SearchSettings,
    records: Vec<Record>,
    selected_columns: Vec<String>,
    search_term: String,
    selected: Option<usize>,
    last_update: Option<DateTime<Local>>,
    diagnostic: Option<String>,
}

impl SessionState {
    pub fn new(schema: FieldSchema, groups: Vec<ColumnGroup>, settings: SearchSettings) -> Self {
        let selected_columns = DEFAULT_COLUMNS
            .iter()
            .filter(|key| schema.contains(key))
            .map(|key| key.to_string())
            .collect();

        let mut state = Self {
            schema,
            groups,
            settings,
            records: Vec::new(),
            selected_columns,
            search_term: String::new(),
            selected: None,
            last_update: None,
            diagnostic: None,
        };
        state.ensure_required_selected();
        state
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    pub fn groups(&self) -> &[ColumnGroup] {
        &self.groups
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn selected_columns(&self) -> &[String] {
        &self.selected_columns
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn selected_record(&self) -> Option<&Record> {
        self.selected.and_then(|i| self.records.get(i))
    }

    pub fn last_update(&self) -> Option<DateTime<Local>> {
        self.last_update
    }

    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }

    /// 套用一次載入結果
    ///
    /// A retrieval failure keeps whatever was loaded before; an empty result
    /// set replaces it.
    pub fn apply_load(&mut self, result: Result<Vec<Record>>) {
        match result {
            Ok(records) => {
                self.replace_records(records);
                self.last_update = Some(Local::now());
                self.diagnostic = None;
            }
            Err(LookupError::EmptyResultSet) => {
                self.replace_records(Vec::new());
                self.last_update = Some(Local::now());
                self.diagnostic = Some(LookupError::EmptyResultSet.user_friendly_message());
            }
            Err(e) => {
                tracing::warn!("Load failed, keeping {} records: {}", self.records.len(), e);
                self.diagnostic = Some(e.user_friendly_message());
            }
        }
    }

    fn replace_records(&mut self, records: Vec<Record>) {
        self.records = records;
        self.selected = None;
    }

    fn ensure_required_selected(&mut self) {
        let required = self.schema.required_key().to_string();
        if !self.selected_columns.contains(&required) {
            self.selected_columns.insert(0, required);
        }
    }

    fn check_column(&self, key: &str) -> Result<()> {
        if self.schema.contains(key) {
            Ok(())
        } else {
            Err(LookupError::ValidationError {
                message: format!("Unknown field '{}'", key),
            })
        }
    }

    /// The required column cannot be toggled off.
    pub fn toggle_column(&mut self, key: &str) -> Result<()> {
        self.check_column(key)?;
        if key == self.schema.required_key() {
            return Ok(());
        }

        if let Some(pos) = self.selected_columns.iter().position(|c| c == key) {
            self.selected_columns.remove(pos);
        } else {
            self.selected_columns.push(key.to_string());
        }
        Ok(())
    }

    pub fn set_columns<S: AsRef<str>>(&mut self, keys: &[S]) -> Result<()> {
        for key in keys {
            self.check_column(key.as_ref())?;
        }
        self.selected_columns = vec![self.schema.required_key().to_string()];
        for key in keys {
            let key = key.as_ref();
            if !self.selected_columns.iter().any(|c| c == key) {
                self.selected_columns.push(key.to_string());
            }
        }
        Ok(())
    }

    pub fn select_group(&mut self, name: &str) -> Result<()> {
        let group = self
            .groups
            .iter()
            .find(|g| g.name.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| LookupError::ValidationError {
                message: format!("Unknown column group '{}'", name),
            })?;
        self.set_columns(&group.columns)
    }

    pub fn select_all(&mut self) {
        self.selected_columns = self.schema.keys().map(str::to_string).collect();
    }

    pub fn clear_selection(&mut self) {
        self.selected_columns = vec![self.schema.required_key().to_string()];
    }

    pub fn set_search_term(&mut self, term: &str) {
        self.search_term = term.to_string();
        self.selected = None;
    }

    /// Indices of records whose name contains the search term, ignoring case.
    pub fn suggestions(&self) -> Vec<usize> {
        if self.search_term.is_empty()
            || self.search_term.chars().count() < self.settings.min_search_chars
        {
            return Vec::new();
        }
        let term = self.search_term.to_lowercase();
        let required = self.schema.required_key();

        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.get(required).to_lowercase().contains(&term))
            .map(|(i, _)| i)
            .take(self.settings.suggestion_limit)
            .collect()
    }

    /// Exact name match ignoring case and surrounding whitespace, regardless
    /// of the minimum search length.
    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        let wanted = name.trim().to_lowercase();
        if wanted.is_empty() {
            return None;
        }
        let required = self.schema.required_key();
        self.records
            .iter()
            .position(|r| r.get(required).to_lowercase() == wanted)
    }

    pub fn select_record(&mut self, index: usize) -> Result<&Record> {
        let name = self
            .records
            .get(index)
            .map(|r| r.get(self.schema.required_key()).to_string())
            .ok_or_else(|| LookupError::ValidationError {
                message: format!("No record at position {}", index),
            })?;
        self.search_term = name;
        self.selected = Some(index);
        Ok(&self.records[index])
    }

    pub fn clear_search(&mut self) {
        self.search_term.clear();
        self.selected = None;
    }

    /// Selected columns other than the required one, as `(label, value)`.
    pub fn display_fields<'a>(&'a self, record: &'a Record) -> Vec<(&'a str, &'a str)> {
        let required = self.schema.required_key();
        self.selected_columns
            .iter()
            .filter(|key| key.as_str() != required)
            .filter_map(|key| self.schema.field(key))
            .map(|field| {
                let value = record.get(&field.key);
                let value = if value.is_empty() { EMPTY_VALUE } else { value };
                (field.label.as_str(), value)
            })
            .collect()
    }

    /// Raw value for copying; `None` when the field is empty or unknown.
    pub fn field_value<'a>(&self, record: &'a Record, key: &str) -> Option<&'a str> {
        Some(record.get(key)).filter(|v| !v.is_empty())
    }

    pub fn preview(&self) -> &[Record] {
        &self.records[..self.records.len().min(PREVIEW_LIMIT)]
    }

    /// Append a record to this session only. Nothing is written to the source.
    pub fn add_record(&mut self, draft: HashMap<String, String>) -> Result<&Record> {
        let required = self.schema.required_key();
        if draft.get(required).map_or(true, |v| v.trim().is_empty()) {
            let label = self
                .schema
                .field(required)
                .map(|f| f.label.as_str())
                .unwrap_or(required);
            return Err(LookupError::ValidationError {
                message: format!("The {} field is required", label),
            });
        }
        if let Some(unknown) = draft.keys().find(|k| !self.schema.contains(k)) {
            return Err(LookupError::ValidationError {
                message: format!("Unknown field '{}'", unknown),
            });
        }

        let data = self
            .schema
            .keys()
            .map(|key| {
                let value = draft.get(key).map(|v| v.trim().to_string()).unwrap_or_default();
                (key.to_string(), value)
            })
            .collect();
        self.records.push(Record { data });

        tracing::info!("Added record in memory only ({} total)", self.records.len());
        Ok(&self.records[self.records.len() - 1])
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(
            FieldSchema::registration(),
            ColumnGroup::registration_groups(),
            SearchSettings::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, email: &str) -> Record {
        let mut data: HashMap<String, String> = FieldSchema::registration()
            .keys()
            .map(|k| (k.to_string(), String::new()))
            .collect();
        data.insert("nome".to_string(), name.to_string());
        data.insert("email".to_string(), email.to_string());
        Record { data }
    }

    fn loaded() -> SessionState {
        let mut state = SessionState::default();
        state.apply_load(Ok(vec![
            record("Ana Silva", "ana@x.com"),
            record("Bruno Costa", ""),
            record("Mariana Alves", "mari@x.com"),
        ]));
        state
    }

    #[test]
    fn test_default_columns() {
        let state = SessionState::default();
        assert_eq!(state.selected_columns(), ["nome", "email", "cpf", "celular"]);
    }

    #[test]
    fn test_toggle_column_keeps_required() {
        let mut state = SessionState::default();
        state.toggle_column("nome").unwrap();
        assert!(state.selected_columns().contains(&"nome".to_string()));

        state.toggle_column("cpf").unwrap();
        assert!(!state.selected_columns().contains(&"cpf".to_string()));
        state.toggle_column("cpf").unwrap();
        assert_eq!(state.selected_columns().last().unwrap(), "cpf");

        assert!(state.toggle_column("unknown").is_err());
    }

    #[test]
    fn test_select_group_puts_required_first_without_duplicates() {
        let mut state = SessionState::default();
        state.select_group("Dados Pessoais").unwrap();
        assert_eq!(
            state.selected_columns(),
            ["nome", "email", "cpf", "rg", "nascimento", "orgaoExpedidor", "expedicaoRg"]
        );

        state.select_group("contato").unwrap();
        assert_eq!(state.selected_columns(), ["nome", "email", "telFixo", "celular", "endereco"]);

        assert!(state.select_group("Nope").is_err());
    }

    #[test]
    fn test_select_all_and_clear() {
        let mut state = SessionState::default();
        state.select_all();
        assert_eq!(state.selected_columns().len(), 22);
        state.clear_selection();
        assert_eq!(state.selected_columns(), ["nome"]);
    }

    #[test]
    fn test_suggestions() {
        let mut state = loaded();

        state.set_search_term("a");
        assert!(state.suggestions().is_empty());

        state.set_search_term("AN");
        assert_eq!(state.suggestions(), vec![0, 2]);

        state.set_search_term("costa");
        assert_eq!(state.suggestions(), vec![1]);
    }

    #[test]
    fn test_empty_term_never_suggests() {
        let mut state = SessionState::new(
            FieldSchema::registration(),
            ColumnGroup::registration_groups(),
            SearchSettings {
                suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
                min_search_chars: 0,
            },
        );
        state.apply_load(Ok(vec![record("Ana", ""), record("Bia", "")]));

        state.set_search_term("");
        assert!(state.suggestions().is_empty());
        state.set_search_term("b");
        assert_eq!(state.suggestions(), vec![1]);
    }

    #[test]
    fn test_find_by_name_ignores_min_search_chars() {
        let mut state = SessionState::default();
        state.apply_load(Ok(vec![record("Ana Silva", ""), record("X", "")]));

        state.set_search_term("X");
        assert!(state.suggestions().is_empty());
        assert_eq!(state.find_by_name("x"), Some(1));
        assert_eq!(state.find_by_name(" ana silva "), Some(0));
        assert_eq!(state.find_by_name("Ana"), None);
        assert_eq!(state.find_by_name(""), None);
    }

    #[test]
    fn test_suggestions_are_capped() {
        let mut state = SessionState::default();
        let many = (0..15).map(|i| record(&format!("Pessoa {}", i), "")).collect();
        state.apply_load(Ok(many));
        state.set_search_term("pessoa");
        assert_eq!(state.suggestions().len(), DEFAULT_SUGGESTION_LIMIT);
        assert_eq!(state.preview().len(), PREVIEW_LIMIT);
    }

    #[test]
    fn test_select_and_clear_search() {
        let mut state = loaded();
        let name = state.select_record(2).unwrap().get("nome").to_string();
        assert_eq!(name, "Mariana Alves");
        assert_eq!(state.search_term(), "Mariana Alves");
        assert!(state.selected_record().is_some());

        state.clear_search();
        assert_eq!(state.search_term(), "");
        assert!(state.selected_record().is_none());

        assert!(state.select_record(99).is_err());
    }

    #[test]
    fn test_display_fields_use_labels_and_placeholder() {
        let state = loaded();
        let bruno = &state.records()[1];
        let fields = state.display_fields(bruno);
        assert_eq!(
            fields,
            vec![("Email", "-"), ("CPF", "-"), ("Celular", "-")]
        );
        assert_eq!(state.field_value(bruno, "email"), None);
        assert_eq!(state.field_value(&state.records()[0], "email"), Some("ana@x.com"));
    }

    #[test]
    fn test_retrieval_failure_keeps_records() {
        let mut state = loaded();
        let updated = state.last_update();
        state.apply_load(Err(LookupError::RetrievalFailure { attempts: 3 }));

        assert_eq!(state.records().len(), 3);
        assert_eq!(state.last_update(), updated);
        assert!(state.diagnostic().unwrap().contains("publicly accessible"));
    }

    #[test]
    fn test_empty_result_set_clears_records() {
        let mut state = loaded();
        state.apply_load(Err(LookupError::EmptyResultSet));
        assert!(state.records().is_empty());
        assert_eq!(state.diagnostic(), Some("No records found in source."));

        state.apply_load(Ok(vec![record("Ana", "")]));
        assert!(state.diagnostic().is_none());
    }

    #[test]
    fn test_add_record_is_in_memory_and_requires_name() {
        let mut state = loaded();

        let mut draft = HashMap::new();
        draft.insert("email".to_string(), "x@x.com".to_string());
        assert!(state.add_record(draft.clone()).is_err());

        draft.insert("nome".to_string(), "  Nova Pessoa ".to_string());
        let added = state.add_record(draft).unwrap();
        assert_eq!(added.get("nome"), "Nova Pessoa");
        assert_eq!(added.data.len(), 22);
        assert_eq!(state.records().len(), 4);

        // 下一次成功載入會丟棄新增的紀錄
        state.apply_load(Ok(vec![record("Ana", "")]));
        assert_eq!(state.records().len(), 1);
    }

    #[test]
    fn test_add_record_rejects_unknown_fields() {
        let mut state = SessionState::default();
        let mut draft = HashMap::new();
        draft.insert("nome".to_string(), "Ana".to_string());
        draft.insert("shoe_size".to_string(), "40".to_string());
        assert!(state.add_record(draft).is_err());
    }
}
