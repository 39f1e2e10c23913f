use crate::domain::model::{FieldSchema, Record};
use std::collections::HashMap;

/// Split one physical line into fields, honouring double-quote quoting.
///
/// `""` inside a quoted section yields a literal `"`. Commas inside quotes are
/// kept. Fields are returned untrimmed and the last field is always pushed,
/// even when empty.
///
/// A quoted field spanning several physical lines is not supported: each line
/// is tokenized on its own.
pub fn tokenize_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);

    fields
}

/// Map tokenized values onto the schema by position. Missing cells become `""`,
/// surplus cells are ignored, every value is trimmed.
pub fn map_row(values: &[String], schema: &FieldSchema) -> Record {
    let data: HashMap<String, String> = schema
        .keys()
        .enumerate()
        .map(|(i, key)| {
            let value = values.get(i).map(|v| v.trim()).unwrap_or("");
            (key.to_string(), value.to_string())
        })
        .collect();

    Record { data }
}

/// Decode a whole CSV document. The first line is a header and is skipped
/// without being checked; blank lines are skipped; rows whose required field
/// is empty after trimming are dropped.
pub fn decode_document(text: &str, schema: &FieldSchema) -> Vec<Record> {
    let required = schema.required_key();
    let mut records = Vec::new();
    let mut dropped = 0usize;

    for line in text.split('\n').skip(1) {
        // CRLF 匯出
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.trim().is_empty() {
            continue;
        }

        let record = map_row(&tokenize_line(line), schema);
        if record.get(required).is_empty() {
            dropped += 1;
            continue;
        }
        records.push(record);
    }

    tracing::debug!(
        "Decoded {} records ({} rows dropped for empty '{}')",
        records.len(),
        dropped,
        required
    );

    records
}
