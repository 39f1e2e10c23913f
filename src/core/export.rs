use crate::domain::model::{FieldSchema, Record};
use crate::utils::error::{LookupError, Result};
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Tsv,
}

impl ExportFormat {
    fn delimiter(self) -> u8 {
        match self {
            ExportFormat::Csv => b',',
            ExportFormat::Tsv => b'\t',
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = LookupError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "tsv" => Ok(ExportFormat::Tsv),
            other => Err(LookupError::ValidationError {
                message: format!("Unsupported export format '{}'. Valid formats: csv, tsv", other),
            }),
        }
    }
}

/// Write `records` restricted to `columns`, headed by the field labels.
pub fn write_records<W: Write>(
    writer: W,
    records: &[Record],
    columns: &[String],
    schema: &FieldSchema,
    format: ExportFormat,
) -> Result<()> {
    let fields = columns
        .iter()
        .map(|key| {
            schema.field(key).ok_or_else(|| LookupError::ValidationError {
                message: format!("Unknown field '{}'", key),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut out = csv::WriterBuilder::new()
        .delimiter(format.delimiter())
        .from_writer(writer);

    out.write_record(fields.iter().map(|f| f.label.as_str()))?;
    for record in records {
        out.write_record(fields.iter().map(|f| record.get(&f.key)))?;
    }
    out.flush()?;

    tracing::debug!("Exported {} records, {} columns", records.len(), fields.len());
    Ok(())
}
