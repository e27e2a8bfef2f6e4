use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Names already present at the destination. Only present names have an entry: a missing key
/// means the name does not exist, never a `false` value.
pub type DuplicateSet = HashMap<String, bool>;

/// The address of a member as stored in the source data set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceAddress {
    #[serde(deserialize_with = "null_is_default")]
    pub cep: String,
    #[serde(deserialize_with = "null_is_default")]
    pub rua: String,
    #[serde(deserialize_with = "null_is_default")]
    pub numero: String,
    #[serde(deserialize_with = "null_is_default")]
    pub bairro: String,
    pub complemento: Option<String>,
}

/// A member as ingested from the source data set.
/// Missing keys and `null` decode to empty values, except for nullable fields which decode to
/// `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceMember {
    #[serde(deserialize_with = "null_is_default")]
    pub name: String,
    #[serde(rename = "data_nascimento", deserialize_with = "null_is_default")]
    pub birth_date: String,
    #[serde(rename = "ano_batismo", deserialize_with = "null_is_default")]
    pub baptism_year: String,
    #[serde(rename = "sexo", deserialize_with = "null_is_default")]
    pub sex: String,
    #[serde(rename = "estado_civil", deserialize_with = "null_is_default")]
    pub marital_status: String,
    #[serde(rename = "data_casamento", deserialize_with = "null_is_default")]
    pub wedding_date: String,
    #[serde(rename = "nome_conjuge")]
    pub spouse_name: Option<String>,
    #[serde(rename = "filho", deserialize_with = "null_is_default")]
    pub has_children: String,
    #[serde(deserialize_with = "null_is_default")]
    pub email: String,
    #[serde(rename = "telefone", deserialize_with = "null_is_default")]
    pub phone: String,
    #[serde(deserialize_with = "null_is_default")]
    pub status: String,
    #[serde(rename = "data_status", deserialize_with = "null_is_default")]
    pub status_date: String,
    #[serde(rename = "validado", deserialize_with = "null_is_default")]
    pub validated: bool,
    #[serde(rename = "endereco", deserialize_with = "null_is_default")]
    pub address: SourceAddress,
}

fn null_is_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    let opt = Option::deserialize(deserializer)?;
    Ok(opt.unwrap_or_default())
}

/// The address of a member in the destination schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub cep: String,
    pub rua: String,
    pub numero: String,
    pub bairro: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub complemento: String,
}

/// A member normalized into the destination schema.
///
/// Built once per source member and never mutated afterwards. Optional source fields are
/// carried as empty strings and left out of the stored document when empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalMember {
    pub name: String,
    #[serde(rename = "dataNascimento")]
    pub birth_date: String,
    #[serde(rename = "anoBatismo")]
    pub baptism_year: i64,
    #[serde(rename = "sexo")]
    pub sex: String,
    #[serde(rename = "estadoCivil")]
    pub marital_status: String,
    #[serde(
        rename = "dataCasamento",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub wedding_date: String,
    #[serde(
        rename = "nomeConjuge",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub spouse_name: String,
    #[serde(rename = "filho")]
    pub has_children: bool,
    pub email: String,
    #[serde(rename = "telefone")]
    pub phone: String,
    pub status: String,
    #[serde(rename = "dataStatus")]
    pub status_date: String,
    #[serde(rename = "validado")]
    pub validated: bool,
    #[serde(rename = "endereco")]
    pub address: Address,
    /// Day and month of birth, formatted as `DD/MM`.
    #[serde(rename = "dataAniversario")]
    pub birth_anniversary: String,
}

/// The result of a single insert attempt. `failure` holds the reason when the insert failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertOutcome {
    pub name: String,
    pub failure: Option<String>,
}

impl InsertOutcome {
    pub fn success(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            failure: None,
        }
    }

    pub fn failed(name: &str, reason: &str) -> Self {
        Self {
            name: name.to_owned(),
            failure: Some(reason.to_owned()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}
