use thiserror::Error;
use uuid::Uuid;

/// Storage-specific errors that can occur during database operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Invalid data format in database
    #[error("Invalid data format: {message} for metric {metric_context}")]
    InvalidDataFormat {
        message: String,
        metric_context: String,
    },

    /// Unsupported or disabled backend
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl StorageError {
    /// Create an invalid data format error with metric context
    pub fn invalid_data_format(
        message: &str,
        metric_uid: Option<Uuid>,
        metric_name: Option<&str>,
    ) -> Self {
        let metric_context = match (metric_uid, metric_name) {
            (Some(uid), Some(name)) => format!("uid={}, name='{}'", uid, name),
            (Some(uid), None) => format!("uid={}", uid),
            (None, Some(name)) => format!("name='{}'", name),
            (None, None) => "unknown metric".to_string(),
        };

        StorageError::InvalidDataFormat {
            message: message.to_string(),
            metric_context,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_data_format_context() {
        let uid = Uuid::nil();
        let error = StorageError::invalid_data_format("bad status", Some(uid), Some("cpu"));
        assert_eq!(
            error.to_string(),
            format!("Invalid data format: bad status for metric uid={}, name='cpu'", uid)
        );

        let error = StorageError::invalid_data_format("bad status", None, None);
        assert!(error.to_string().ends_with("unknown metric"));
    }
}
