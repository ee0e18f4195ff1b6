//! Common error types used across the workspace.
//!
//! [`ThermoTrackError`] is the error crossing port boundaries. Each adapter
//! defines its own typed error and converts into the matching boxed variant.

/// Base error for every port in the workspace.
#[derive(Debug, thiserror::Error)]
pub enum ThermoTrackError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// An inbound command could not be understood.
    #[error("invalid command")]
    Command(#[from] CommandError),

    /// A sensor or actuator backend failed.
    #[error("hardware error")]
    Hardware(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The pub/sub transport failed.
    #[error("transport error")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The persistence backend failed.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// A device uid was empty.
    #[error("device uid must not be empty")]
    EmptyDeviceUid,

    /// A temperature threshold outside the supported range.
    #[error("temperature threshold {0} is outside [-40, 80] °C")]
    ThresholdOutOfRange(f64),
}

/// Reasons an inbound message is rejected as a command.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The payload is not valid JSON.
    #[error("malformed command payload")]
    Malformed(#[source] serde_json::Error),

    /// The payload has no `cmd` field.
    #[error("payload has no `cmd` field")]
    NotACommand,

    /// The `cmd` value is not part of the vocabulary.
    #[error("unknown command `{0}`")]
    Unknown(String),

    /// The command needs an argument that is missing or of the wrong type.
    #[error("command `{command}` requires field `{field}`")]
    MissingField {
        command: &'static str,
        field: &'static str,
    },

    /// The requested preset does not exist.
    #[error("unknown preset `{0}`")]
    UnknownPreset(String),

    /// The command argument violates a domain invariant.
    #[error("invalid argument")]
    Invalid(#[from] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_wrap_validation_error() {
        let err: ThermoTrackError = ValidationError::EmptyDeviceUid.into();
        assert!(matches!(
            err,
            ThermoTrackError::Validation(ValidationError::EmptyDeviceUid)
        ));
    }

    #[test]
    fn should_display_unknown_command() {
        let err = CommandError::Unknown("dance".to_string());
        assert_eq!(err.to_string(), "unknown command `dance`");
    }

    #[test]
    fn should_display_missing_field() {
        let err = CommandError::MissingField {
            command: "set_threshold",
            field: "value",
        };
        assert_eq!(
            err.to_string(),
            "command `set_threshold` requires field `value`"
        );
    }
}
