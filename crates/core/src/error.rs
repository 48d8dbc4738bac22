/// Result alias that carries the custom [`LightError`] type.
pub type Result<T> = std::result::Result<T, LightError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum LightError {
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Configuration or script files that are not valid JSON.
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    /// Configuration values that parse but cannot drive the engine.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The display backend failed to acquire or present a surface.
    #[error("display error: {0}")]
    Display(String),
}

impl LightError {
    pub fn invalid_config<T: Into<String>>(msg: T) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn display<T: Into<String>>(msg: T) -> Self {
        Self::Display(msg.into())
    }
}
