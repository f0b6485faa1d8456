use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinkError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (bad threshold, no counties, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// Missing required column in a CSV source.
    #[error("{source_name}: missing column '{column}'")]
    MissingColumn { source_name: String, column: String },
    /// Malformed CSV content.
    #[error("{source_name}: {message}")]
    Csv { source_name: String, message: String },
    /// IO error (file read, etc.).
    #[error("IO error: {0}")]
    Io(String),
    /// The requested county has no reference partition.
    #[error("no reference partition for county '{0}'")]
    PartitionNotFound(String),
}
