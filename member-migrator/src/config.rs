use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::str::FromStr;
use std::time;

use envconfig::Envconfig;
use member_common::pgstore::TableName;

use crate::normalizer::OnInvalidRecord;
use crate::pipeline::MigrationSettings;

#[derive(Envconfig, Clone)]
pub struct Config {
    pub database_url: String,

    #[envconfig(default = "public")]
    pub source_schema: NonEmptyString,

    pub source_table: NonEmptyString,

    #[envconfig(default = "public")]
    pub destination_schema: NonEmptyString,

    pub destination_table: NonEmptyString,

    #[envconfig(default = "10000")]
    pub connect_timeout: EnvMsDuration,

    #[envconfig(default = "15000")]
    pub operation_timeout: EnvMsDuration,

    #[envconfig(default = "10")]
    pub max_concurrent_inserts: NonZeroUsize,

    #[envconfig(default = "20")]
    pub max_pg_connections: u32,

    #[envconfig(default = "abort")]
    pub on_invalid_record: OnInvalidRecord,

    #[envconfig(default = ".")]
    pub report_dir: PathBuf,

    pub metrics_path: Option<PathBuf>,
}

impl Config {
    pub fn source_table(&self) -> TableName {
        TableName::new(self.source_schema.as_str(), self.source_table.as_str())
    }

    pub fn destination_table(&self) -> TableName {
        TableName::new(
            self.destination_schema.as_str(),
            self.destination_table.as_str(),
        )
    }

    pub fn migration_settings(&self) -> MigrationSettings {
        MigrationSettings {
            max_concurrent_inserts: self.max_concurrent_inserts,
            on_invalid_record: self.on_invalid_record,
            report_dir: self.report_dir.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EnvMsDuration(pub time::Duration);

#[derive(Debug, PartialEq, Eq)]
pub struct ParseEnvMsDurationError;

impl FromStr for EnvMsDuration {
    type Err = ParseEnvMsDurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ms = s.parse::<u64>().map_err(|_| ParseEnvMsDurationError)?;

        Ok(EnvMsDuration(time::Duration::from_millis(ms)))
    }
}

#[derive(Debug, Clone)]
pub struct NonEmptyString(pub String);

impl NonEmptyString {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct StringIsEmptyError;

impl FromStr for NonEmptyString {
    type Err = StringIsEmptyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            Err(StringIsEmptyError)
        } else {
            Ok(NonEmptyString(s.to_owned()))
        }
    }
}
