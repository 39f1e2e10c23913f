use crate::utils::error::{LookupError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One decoded row. Every schema key is present; missing cells hold `""`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub data: HashMap<String, String>,
}

impl Record {
    pub fn get(&self, key: &str) -> &str {
        self.data.get(key).map(String::as_str).unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub required: bool,
}

impl FieldSpec {
    pub fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            required: false,
        }
    }

    pub fn required(key: &str, label: &str) -> Self {
        Self {
            required: true,
            ..Self::new(key, label)
        }
    }
}

/// Ordered field list. Position `i` maps CSV column `i` to `fields[i].key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSchema {
    fields: Vec<FieldSpec>,
    required_index: usize,
}

impl FieldSchema {
    /// 欄位鍵必須唯一，且恰好一個必填欄位
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self> {
        let mut required = fields.iter().enumerate().filter(|(_, f)| f.required);
        let required_index = match (required.next(), required.next()) {
            (Some((index, _)), None) => index,
            (None, _) => {
                return Err(LookupError::ConfigError {
                    message: "Field schema must mark exactly one field as required, found none"
                        .to_string(),
                })
            }
            (Some(_), Some(_)) => {
                return Err(LookupError::ConfigError {
                    message: "Field schema must mark exactly one field as required, found several"
                        .to_string(),
                })
            }
        };

        for (i, field) in fields.iter().enumerate() {
            if field.key.trim().is_empty() {
                return Err(LookupError::ConfigError {
                    message: format!("Field at position {} has an empty key", i),
                });
            }
            if fields[..i].iter().any(|f| f.key == field.key) {
                return Err(LookupError::ConfigError {
                    message: format!("Duplicate field key '{}'", field.key),
                });
            }
        }

        Ok(Self {
            fields,
            required_index,
        })
    }

    /// 登記表的 22 欄
    pub fn registration() -> Self {
        let fields = vec![
            FieldSpec::required("nome", "Nome"),
            FieldSpec::new("email", "Email"),
            FieldSpec::new("formacao", "Formação"),
            FieldSpec::new("matricula", "Número de matrícula"),
            FieldSpec::new("ctf", "Cadastro Técnico Federal"),
            FieldSpec::new("conselho", "Conselho"),
            FieldSpec::new("cpf", "CPF"),
            FieldSpec::new("rg", "RG"),
            FieldSpec::new("nascimento", "Data de nascimento"),
            FieldSpec::new("orgaoExpedidor", "Órgão expedidor"),
            FieldSpec::new("expedicaoRg", "Expedição (RG)"),
            FieldSpec::new("endereco", "Endereço completo"),
            FieldSpec::new("telFixo", "Telefone Fixo"),
            FieldSpec::new("celular", "Celular"),
            FieldSpec::new("programa", "Programa"),
            FieldSpec::new("lattes", "Link Lattes"),
            FieldSpec::new("bancoPix", "Banco PIX"),
            FieldSpec::new("agenciaPix", "Agência"),
            FieldSpec::new("contaPix", "Conta Corrente"),
            FieldSpec::new("banco2", "Banco"),
            FieldSpec::new("agencia2", "Agência"),
            FieldSpec::new("conta2", "Conta Corrente"),
        ];
        Self {
            fields,
            required_index: 0,
        }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn required_key(&self) -> &str {
        &self.fields[self.required_index].key
    }

    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.field(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.key.as_str())
    }
}

impl Default for FieldSchema {
    fn default() -> Self {
        Self::registration()
    }
}

/// Named quick selection of display columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnGroup {
    pub name: String,
    pub columns: Vec<String>,
}

impl ColumnGroup {
    fn new(name: &str, columns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn registration_groups() -> Vec<ColumnGroup> {
        vec![
            Self::new(
                "Dados Pessoais",
                &["nome", "email", "cpf", "rg", "nascimento", "orgaoExpedidor", "expedicaoRg"],
            ),
            Self::new("Contato", &["email", "telFixo", "celular", "endereco"]),
            Self::new(
                "Profissional",
                &["formacao", "matricula", "ctf", "conselho", "programa", "lattes"],
            ),
            Self::new(
                "Dados Bancários",
                &["bancoPix", "agenciaPix", "contaPix", "banco2", "agencia2", "conta2"],
            ),
        ]
    }
}

/// What a single retrieval attempt produced at the transport level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_schema_shape() {
        let schema = FieldSchema::registration();
        assert_eq!(schema.len(), 22);
        assert_eq!(schema.required_key(), "nome");
        assert_eq!(schema.fields().iter().filter(|f| f.required).count(), 1);
        assert_eq!(schema.fields()[21].key, "conta2");

        // 透過 new 驗證一次
        assert!(FieldSchema::new(schema.fields().to_vec()).is_ok());
    }

    #[test]
    fn test_schema_requires_exactly_one_required_field() {
        let none = vec![FieldSpec::new("a", "A"), FieldSpec::new("b", "B")];
        assert!(FieldSchema::new(none).is_err());

        let two = vec![FieldSpec::required("a", "A"), FieldSpec::required("b", "B")];
        assert!(FieldSchema::new(two).is_err());

        let ok = vec![FieldSpec::new("a", "A"), FieldSpec::required("b", "B")];
        let schema = FieldSchema::new(ok).unwrap();
        assert_eq!(schema.required_key(), "b");
    }

    #[test]
    fn test_schema_rejects_duplicate_keys() {
        let dup = vec![FieldSpec::required("a", "A"), FieldSpec::new("a", "Again")];
        assert!(FieldSchema::new(dup).is_err());
    }

    #[test]
    fn test_groups_reference_schema_keys() {
        let schema = FieldSchema::registration();
        for group in ColumnGroup::registration_groups() {
            for column in &group.columns {
                assert!(schema.contains(column), "{} not in schema", column);
            }
        }
    }

    #[test]
    fn test_fetch_response_success_range() {
        assert!(FetchResponse::new(200, "x").is_success());
        assert!(FetchResponse::new(204, "").is_success());
        assert!(!FetchResponse::new(302, "x").is_success());
        assert!(!FetchResponse::new(404, "x").is_success());
    }
}
