use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ::config::ConfigError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Engine(#[from] engine::EngineError),
    #[error("invalid setting {0}: {1}")]
    Setting(&'static str, String),
}

impl AppError {
    /// Message shown to the operator.
    pub fn operator_message(&self) -> String {
        match self {
            Self::Engine(engine::EngineError::Validation { field, reason }) => {
                format!("{field}: {reason}")
            }
            Self::Engine(engine::EngineError::Persistence(_)) => {
                "Could not save. Your changes are not durable yet, please retry.".to_string()
            }
            other => other.to_string(),
        }
    }
}
