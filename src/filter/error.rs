use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("Invalid value for {key}. Must be a number.")]
    InvalidInteger { key: String },

    #[error("Invalid value for {key}. Must be between {min} and {max}.")]
    OutOfRange { key: String, min: i64, max: i64 },

    #[error("Invalid value for {key}. Max length is {max} characters.")]
    TooLong { key: String, max: usize },

    #[error("Invalid limit: {0}")]
    InvalidLimit(String),

    #[error("Invalid offset: {0}")]
    InvalidOffset(String),
}

impl FilterError {
    /// Query-string key the error refers to
    pub fn key(&self) -> &str {
        match self {
            FilterError::InvalidInteger { key }
            | FilterError::OutOfRange { key, .. }
            | FilterError::TooLong { key, .. } => key,
            FilterError::InvalidLimit(_) => "limit",
            FilterError::InvalidOffset(_) => "skip",
        }
    }
}
