//! Core analysis errors

/// Errors raised by analyzers and the analysis session
///
/// An absent box is never an error; it is a modeled state every analyzer handles.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("No detection data loaded: load a recording before calling {operation}")]
    NoData { operation: &'static str },

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

impl AnalysisError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;
