//! Structured error types for core operations.

use serde::Serialize;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    MissingRequiredField,
    InvalidFieldValue,
    InvalidDocument,
    UnknownCollection,
    EphemeralCollection,

    // Not found errors
    ClientNotFound,
    EngagementNotFound,
    TaskNotFound,
    InteractionNotFound,
    UserNotFound,
    ReportNotFound,

    // Conflict errors
    AlreadyExists,
    DuplicateExternalId,

    // Internal errors
    StorageError,
    InternalError,
}

/// Structured error surfaced to the presentation layer.
#[derive(Debug, Serialize)]
pub struct CoreError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl CoreError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
            details: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("{} is required", field),
        )
        .with_field(field)
    }

    pub fn invalid_value(field: &str, reason: &str) -> Self {
        Self::new(ErrorCode::InvalidFieldValue, reason).with_field(field)
    }

    pub fn invalid_document(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidDocument, reason)
    }

    pub fn unknown_collection(name: &str) -> Self {
        Self::new(
            ErrorCode::UnknownCollection,
            format!("Unknown collection: {}", name),
        )
    }

    pub fn ephemeral_collection(name: &str) -> Self {
        Self::new(
            ErrorCode::EphemeralCollection,
            format!("Collection '{}' is session-only and cannot be persisted", name),
        )
    }

    pub fn client_not_found(name: &str) -> Self {
        Self::new(
            ErrorCode::ClientNotFound,
            format!("Client not found: {}", name),
        )
    }

    pub fn engagement_not_found(id: &str) -> Self {
        Self::new(
            ErrorCode::EngagementNotFound,
            format!("Engagement not found: {}", id),
        )
    }

    pub fn task_not_found(engagement_id: &str, task_id: &str) -> Self {
        Self::new(
            ErrorCode::TaskNotFound,
            format!("Task {} not found in engagement {}", task_id, engagement_id),
        )
    }

    pub fn interaction_not_found(id: &str) -> Self {
        Self::new(
            ErrorCode::InteractionNotFound,
            format!("Interaction not found: {}", id),
        )
    }

    pub fn user_not_found(id: &str) -> Self {
        Self::new(ErrorCode::UserNotFound, format!("User not found: {}", id))
    }

    pub fn report_not_found(id: &str) -> Self {
        Self::new(
            ErrorCode::ReportNotFound,
            format!("Report not found: {}", id),
        )
    }

    pub fn already_exists(what: &str, key: &str) -> Self {
        Self::new(
            ErrorCode::AlreadyExists,
            format!("{} already exists: {}", what, key),
        )
    }

    pub fn duplicate_external_id(external_id: &str) -> Self {
        Self::new(
            ErrorCode::DuplicateExternalId,
            format!("Duplicate user externalId: {}", external_id),
        )
        .with_field("externalId")
    }

    pub fn storage(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::StorageError, err.to_string())
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CoreError {}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for CoreError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<CoreError>() {
            Ok(core_err) => core_err,
            Err(err) => match err.downcast::<crate::db::StoreError>() {
                Ok(store_err) => CoreError::storage(store_err),
                Err(err) => CoreError::internal(err),
            },
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::invalid_document(format!("Invalid JSON: {}", err))
    }
}

/// Result type for core operations.
pub type CoreResult<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_serializes_screaming_snake() {
        let err = CoreError::missing_field("clientName");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "MISSING_REQUIRED_FIELD");
        assert_eq!(json["field"], "clientName");
        assert!(json.get("details").is_none());
    }

    #[test]
    fn test_anyhow_roundtrip_keeps_core_error() {
        let err: anyhow::Error = CoreError::client_not_found("Acme").into();
        let back = CoreError::from(err);
        assert_eq!(back.code, ErrorCode::ClientNotFound);
        assert_eq!(back.message, "Client not found: Acme");
    }

    #[test]
    fn test_anyhow_other_becomes_internal() {
        let back = CoreError::from(anyhow::anyhow!("boom"));
        assert_eq!(back.code, ErrorCode::InternalError);
    }
}
