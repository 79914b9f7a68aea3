use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AccumError {
    #[error("invalid {what} pattern `{pattern}`")]
    InvalidPattern { what: &'static str, pattern: String },
}
