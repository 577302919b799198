//! Source attempt errors

use thiserror::Error;

/// Why one source attempt produced no usable value.
///
/// Every variant is local to a single attempt: the resolver logs it and moves
/// on to the next source in the chain.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SourceError {
    /// Network failure before a response arrived
    #[error("Transport failure for {url}: {reason}")]
    Transport { url: String, reason: String },
    /// Response with a non-2xx status
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },
    /// Request exceeded its timeout
    #[error("Timed out after {timeout_ms}ms: {url}")]
    Timeout { url: String, timeout_ms: u64 },
    /// Body could not be parsed in the adapter's format
    #[error("Malformed payload from {url}: {reason}")]
    Malformed { url: String, reason: String },
    /// Payload parsed but no recognizable price node was found
    #[error("No price found for {commodity}")]
    ShapeNotFound { commodity: String },
    /// Value present but its unit or currency could not be converted
    #[error("Normalization failed: {0}")]
    Normalization(String),
    /// Normalized value outside the plausible range
    #[error("Value {value} outside plausible range [{min}, {max}]")]
    PlausibilityRejected { value: f64, min: f64, max: f64 },
    /// An optional capability (e.g. a rendering engine) is not available
    #[error("Capability unavailable: {0}")]
    Unavailable(String),
}

impl SourceError {
    /// Short label for metrics and attempt logs
    pub fn kind(&self) -> &'static str {
        match self {
            SourceError::Transport { .. } => "transport",
            SourceError::Status { .. } => "status",
            SourceError::Timeout { .. } => "timeout",
            SourceError::Malformed { .. } => "malformed",
            SourceError::ShapeNotFound { .. } => "shape_not_found",
            SourceError::Normalization(_) => "normalization",
            SourceError::PlausibilityRejected { .. } => "plausibility_rejected",
            SourceError::Unavailable(_) => "unavailable",
        }
    }

    /// Transport-level failures are worth retrying within one attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SourceError::Transport { .. } | SourceError::Timeout { .. }
        ) || matches!(self, SourceError::Status { status, .. } if *status >= 500 || *status == 429)
    }
}
