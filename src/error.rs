use thiserror::Error;

/// Failures of the persistence medium.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StorageError {
    /// True when the document simply has not been written yet.
    pub fn is_missing(&self) -> bool {
        matches!(self, StorageError::Io(err) if err.kind() == std::io::ErrorKind::NotFound)
    }
}

#[derive(Debug, Error)]
pub enum TaskError {
    /// Rejected input; the store is left unchanged.
    #[error("invalid task: {0}")]
    Validation(String),

    #[error("task not found: {0}")]
    NotFound(String),

    /// The mutation was applied in memory but could not be saved.
    #[error("storage error: {0}")]
    Persistence(#[from] StorageError),
}

/// Error type returned by notification handlers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_documents_are_distinguished_from_other_failures() {
        let missing = StorageError::Io(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(missing.is_missing());

        let denied = StorageError::Io(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        assert!(!denied.is_missing());

        let corrupt: StorageError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(!corrupt.is_missing());
        assert!(corrupt.to_string().starts_with("json error"));
    }

    #[test]
    fn task_errors_render_their_context() {
        assert_eq!(
            TaskError::Validation("task name is required".into()).to_string(),
            "invalid task: task name is required"
        );
        assert_eq!(
            TaskError::NotFound("abc".into()).to_string(),
            "task not found: abc"
        );
        let err: TaskError = StorageError::Io(std::io::Error::other("disk full")).into();
        assert!(matches!(err, TaskError::Persistence(_)));
        assert_eq!(err.to_string(), "storage error: io error: disk full");
    }
}
