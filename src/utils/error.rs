use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChunkcastError {
    #[error("Invalid chunk length {value}: must satisfy 0 < length < {ceiling}")]
    InvalidChunkLength { value: i64, ceiling: usize },

    #[error("Invalid root rank {root} for a group of size {size}")]
    InvalidRoot { root: usize, size: usize },

    #[error("Source mismatch on rank {rank} (root {root}): {message}")]
    SourceMismatch {
        rank: usize,
        root: usize,
        message: String,
    },

    #[error("Datatype mismatch: expected {expected}, received {received}")]
    DatatypeMismatch { expected: String, received: String },

    #[error("Message of {count} elements exceeds transport ceiling {ceiling}")]
    MessageTooLarge { count: usize, ceiling: usize },

    #[error("Transport error: {message}")]
    TransportError { message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task join error: {0}")]
    TaskJoinError(#[from] tokio::task::JoinError),

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Precondition,
    Transport,
    Data,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ChunkcastError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ChunkcastError::InvalidChunkLength { .. }
            | ChunkcastError::InvalidRoot { .. }
            | ChunkcastError::SourceMismatch { .. } => ErrorCategory::Precondition,
            ChunkcastError::DatatypeMismatch { .. }
            | ChunkcastError::MessageTooLarge { .. }
            | ChunkcastError::TransportError { .. } => ErrorCategory::Transport,
            ChunkcastError::ProcessingError { .. } | ChunkcastError::SerializationError(_) => {
                ErrorCategory::Data
            }
            ChunkcastError::ConfigValidationError { .. }
            | ChunkcastError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            ChunkcastError::IoError(_) | ChunkcastError::TaskJoinError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Precondition | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Transport => ErrorSeverity::Medium,
            ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ChunkcastError::InvalidChunkLength { .. } => {
                "Pick a chunk length between 1 and the transport ceiling minus one"
            }
            ChunkcastError::InvalidRoot { .. } => "Choose a root rank smaller than the group size",
            ChunkcastError::SourceMismatch { .. } => {
                "Pass the data only on the root rank and no data on every other rank"
            }
            ChunkcastError::DatatypeMismatch { .. } => {
                "Make sure every rank requests the same element type"
            }
            ChunkcastError::MessageTooLarge { .. } => {
                "Lower the chunk length or raise the transport ceiling"
            }
            ChunkcastError::TransportError { .. } => {
                "Check that every rank joins each collective call in the same order"
            }
            ChunkcastError::ProcessingError { .. } => "Re-run with --verbose to inspect the mismatch",
            ChunkcastError::SerializationError(_) => {
                "Check that the broadcast value round-trips through JSON"
            }
            ChunkcastError::IoError(_) => "Check file paths and permissions",
            ChunkcastError::TaskJoinError(_) => "A rank task panicked or was cancelled; check the logs",
            ChunkcastError::ConfigValidationError { .. }
            | ChunkcastError::InvalidConfigValueError { .. } => "Fix the configuration and try again",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Precondition => format!("Invalid broadcast arguments: {}", self),
            ErrorCategory::Transport => format!("Communication failed: {}", self),
            ErrorCategory::Data => format!("Broadcast data problem: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, ChunkcastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_errors_are_high_severity() {
        let err = ChunkcastError::InvalidChunkLength {
            value: -1,
            ceiling: 10,
        };
        assert_eq!(err.category(), ErrorCategory::Precondition);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().contains("-1"));
    }

    #[test]
    fn test_transport_errors_are_retryable() {
        let err = ChunkcastError::MessageTooLarge {
            count: 20,
            ceiling: 10,
        };
        assert_eq!(err.severity(), ErrorSeverity::Medium);
    }
}
