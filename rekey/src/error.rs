use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RekeyError {
    #[error("invalid parameter {name}={value}: {constraint}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        constraint: &'static str,
    },
}

impl RekeyError {
    pub(crate) fn invalid(
        name: &'static str,
        value: impl ToString,
        constraint: &'static str,
    ) -> Self {
        RekeyError::InvalidParameter {
            name,
            value: value.to_string(),
            constraint,
        }
    }
}

pub type Result<T> = std::result::Result<T, RekeyError>;
