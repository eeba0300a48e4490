//! Centralized error types for the Ladok workspace.

use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::types::ActivityId;

/// Top-level error enum. Variants map to subsystems.
///
/// The permission variants split into two groups: `NoPermissionsProvided`
/// and `Transport` mean the check could not be performed, while
/// `NoPermissionFoundInLadok` and `MissingPermissions` mean it ran and
/// found gaps.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LadokError {
    #[error("Malformed feed identifier: {0:?}")]
    MalformedFeedIdentifier(String),

    #[error("No permissions provided")]
    NoPermissionsProvided,

    #[error("No permission found in ladok")]
    NoPermissionFoundInLadok,

    #[error("{0}")]
    MissingPermissions(PermissionErrors),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation timed out after {0:?}")]
    TimedOut(Duration),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type LadokResult<T> = Result<T, LadokError>;

/// Failures raised while talking to the remote system.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// The remote system answered with a structured error body.
    #[error("{0}")]
    Api(ApiError),

    #[error("Unexpected HTTP status {status}")]
    Status { status: u16 },

    #[error("No valid content type: {0:?}")]
    UnsupportedContentType(String),

    /// Success status without a body where one was expected.
    #[error("Empty response body (HTTP {status})")]
    EmptyBody { status: u16 },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Client certificate error: {0}")]
    Certificate(String),
}

/// Error body returned by the remote system on failed calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApiError {
    #[serde(rename = "FelUID")]
    pub fel_uid: String,
    #[serde(rename = "Felkategori")]
    pub felkategori: String,
    #[serde(rename = "FelkategoriText")]
    pub felkategori_text: String,
    #[serde(rename = "Felgrupp")]
    pub felgrupp: String,
    #[serde(rename = "FelgruppText")]
    pub felgrupp_text: String,
    #[serde(rename = "Detaljkod")]
    pub detaljkod: String,
    #[serde(rename = "DetaljkodText")]
    pub detaljkod_text: String,
    #[serde(rename = "Meddelande")]
    pub meddelande: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ladok error {}: {}", self.felkategori, self.meddelande)?;
        if !self.fel_uid.is_empty() {
            write!(f, " (FelUID {})", self.fel_uid)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Permission gaps
// ---------------------------------------------------------------------------

/// One activity the caller lacks a sufficient level for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingPermission {
    pub activity_id: ActivityId,
    /// Level name as the caller supplied it.
    pub level: String,
}

impl fmt::Display for MissingPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Missing ladok permission {} at level {}",
            self.activity_id, self.level
        )
    }
}

/// Every unmet requirement of one check, in ascending activity order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionErrors(pub Vec<MissingPermission>);

impl PermissionErrors {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MissingPermission> {
        self.0.iter()
    }
}

impl fmt::Display for PermissionErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, missing) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{missing}")?;
        }
        Ok(())
    }
}
