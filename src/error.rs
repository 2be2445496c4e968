use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Missing expected column in source table: {0}")]
    MissingColumn(String),

    #[error("Configuration section [{0}] is not defined")]
    MissingConfigSection(&'static str),

    #[error("Required fields could not be resolved: {0}")]
    MissingRequiredFields(String),

    #[error("Fiscal period label is missing or empty")]
    EmptyPeriodLabel,

    #[error("Failed to extract a fiscal year from period label: '{0}'")]
    UnparsableFiscalYear(String),

    #[error("Failed to extract a quarter from period label: '{0}'")]
    UnparsableQuarter(String),

    #[error("No catalog item registered for element id: {0}")]
    UnmappedElementId(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Table read error: {0}")]
    TableRead(#[from] csv::Error),

    #[error("Configuration parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
