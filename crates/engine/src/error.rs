//! Error types for the analysis engine.

use mangrove_core::Error;
use thiserror::Error;

use crate::request::AnalysisRequest;

/// Errors produced by the analysis engine.
///
/// `Clone` so that a single failed computation can be delivered to every
/// caller that was waiting on it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The analysis itself failed; the offending request is echoed back.
    #[error("{request} failed: {source}")]
    Analysis {
        request: Box<AnalysisRequest>,
        #[source]
        source: Error,
    },

    #[error(transparent)]
    Core(#[from] Error),

    #[error("invalid engine configuration: {0}")]
    Config(String),

    #[error("worker pool error: {0}")]
    Pool(String),
}

impl EngineError {
    pub fn analysis(request: &AnalysisRequest, source: Error) -> Self {
        EngineError::Analysis {
            request: Box::new(request.clone()),
            source,
        }
    }

    /// The underlying core error, if any.
    pub fn core_error(&self) -> Option<&Error> {
        match self {
            EngineError::Analysis { source, .. } => Some(source),
            EngineError::Core(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.core_error(), Some(Error::Cancelled))
    }

    /// The request that failed, for analysis errors.
    pub fn request(&self) -> Option<&AnalysisRequest> {
        match self {
            EngineError::Analysis { request, .. } => Some(request),
            _ => None,
        }
    }
}

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
