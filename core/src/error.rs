use thiserror::Error;

/// Box provisioning error types
#[derive(Error, Debug)]
pub enum BoxError {
    /// Configuration error (e.g. no resolvable base template)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An external command exited unsuccessfully where success was required
    #[error("{message}: `{command}` exited with {}", exit_code_display(.exit_code))]
    ExternalCommand {
        command: String,
        exit_code: Option<i32>,
        message: String,
    },

    /// An external command could not be launched at all
    #[error("Failed to launch `{command}`: {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// An expected identifier or pattern is absent from hypervisor output
    #[error("Not found: {0}")]
    NotFound(String),

    /// Template installation failed
    #[error("Provisioning error: {0}")]
    ProvisioningError(String),

    /// Dump output did not yield a usable archive
    #[error("Packaging error: {0}")]
    PackagingError(String),

    /// Artifact store rejected an upload or alias request
    #[error("Artifact store error: {key} - {message}")]
    StoreError { key: String, message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

fn exit_code_display(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

impl From<serde_json::Error> for BoxError {
    fn from(err: serde_json::Error) -> Self {
        BoxError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for BoxError {
    fn from(err: serde_yaml::Error) -> Self {
        BoxError::SerializationError(err.to_string())
    }
}

/// Result type alias for box provisioning operations
pub type Result<T> = std::result::Result<T, BoxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = BoxError::ConfigError("no base template for box 'ruby'".to_string());
        assert_eq!(
            error.to_string(),
            "Configuration error: no base template for box 'ruby'"
        );
    }

    #[test]
    fn test_external_command_error_display() {
        let error = BoxError::ExternalCommand {
            command: "vzctl start travis-development".to_string(),
            exit_code: Some(32),
            message: "Could not bring box travis-development up".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Could not bring box travis-development up: `vzctl start travis-development` exited with status 32"
        );
    }

    #[test]
    fn test_external_command_error_without_exit_code() {
        let error = BoxError::ExternalCommand {
            command: "vzdump 1001".to_string(),
            exit_code: None,
            message: "Could not dump box".to_string(),
        };
        assert!(error.to_string().ends_with("no status (terminated by signal)"));
    }

    #[test]
    fn test_command_spawn_error_display() {
        let error = BoxError::CommandSpawn {
            command: "vzlist -a -H -o ctid".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "No such file"),
        };
        assert_eq!(
            error.to_string(),
            "Failed to launch `vzlist -a -H -o ctid`: No such file"
        );
    }

    #[test]
    fn test_not_found_error_display() {
        let error = BoxError::NotFound("container id for travis-development".to_string());
        assert_eq!(
            error.to_string(),
            "Not found: container id for travis-development"
        );
    }

    #[test]
    fn test_packaging_error_display() {
        let error = BoxError::PackagingError("no archive announced".to_string());
        assert_eq!(error.to_string(), "Packaging error: no archive announced");
    }

    #[test]
    fn test_store_error_display() {
        let error = BoxError::StoreError {
            key: "provisioned/travis-development.tar.gz".to_string(),
            message: "403 Forbidden".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Artifact store error: provisioned/travis-development.tar.gz - 403 Forbidden"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let box_error: BoxError = io_error.into();
        assert!(matches!(box_error, BoxError::IoError(_)));
        assert!(box_error.to_string().contains("file not found"));
    }

    #[test]
    fn test_serde_yaml_error_conversion() {
        let yaml_str = "invalid: yaml: content:";
        let result: std::result::Result<serde_yaml::Value, _> = serde_yaml::from_str(yaml_str);
        let box_error: BoxError = result.unwrap_err().into();
        assert!(matches!(box_error, BoxError::SerializationError(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let result: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ nope");
        let box_error: BoxError = result.unwrap_err().into();
        assert!(matches!(box_error, BoxError::SerializationError(_)));
    }
}
