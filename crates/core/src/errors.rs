use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification of mining failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidParameter,
    EmptyInput,
    InternalInvariantViolation,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MiningError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("empty input: {0}")]
    EmptyInput(String),
    #[error("support for subset {itemset} was not computed by the miner")]
    MissingSubsetSupport { itemset: String },
    #[error("malformed itemset: {0}")]
    MalformedItemset(String),
}

impl MiningError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidParameter(_) => ErrorKind::InvalidParameter,
            Self::EmptyInput(_) => ErrorKind::EmptyInput,
            Self::MissingSubsetSupport { .. } | Self::MalformedItemset(_) => {
                ErrorKind::InternalInvariantViolation
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum DataError {
    #[error("could not read records file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse records file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: serde_json::Error },
    #[error("no line records left after cleaning ({dropped} dropped)")]
    NothingLeft { dropped: usize },
}

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Mining(#[from] MiningError),
    #[error(transparent)]
    Data(#[from] DataError),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. } | Self::Internal { correlation_id, .. } => {
                correlation_id
            }
        }
    }
}

impl ApplicationError {
    /// Stable label used by the CLI's `error_class` field.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Mining(error) => match error.kind() {
                ErrorKind::InvalidParameter => "invalid_parameter",
                ErrorKind::EmptyInput => "empty_input",
                ErrorKind::InternalInvariantViolation => "internal_invariant_violation",
            },
            Self::Data(_) => "data_input",
            Self::Configuration(_) => "config_validation",
        }
    }

    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let correlation_id = "unassigned".to_owned();
        match value {
            ApplicationError::Mining(error)
                if error.kind() == ErrorKind::InternalInvariantViolation =>
            {
                Self::Internal { message: error.to_string(), correlation_id }
            }
            ApplicationError::Mining(error) => {
                Self::BadRequest { message: error.to_string(), correlation_id }
            }
            ApplicationError::Data(error) => {
                Self::BadRequest { message: error.to_string(), correlation_id }
            }
            ApplicationError::Configuration(message) => Self::Internal { message, correlation_id },
        }
    }
}
