#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Threshold configuration rejected at startup (empty list, duplicate
    /// value, non-finite value or negative duration).
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
}
