//! Domain models, shared types, and error definitions.
//!
//! Foundation crate -- no async or I/O dependencies.

pub mod atom;
pub mod error;
pub mod levels;
pub mod types;

pub use atom::FeedDocument;
pub use error::{
    ApiError, LadokError, LadokResult, MissingPermission, PermissionErrors, TransportError,
};
pub use types::{
    ActivityGrant, ActivityId, EventContext, EventKind, EventPayload, Feed, GrantEntry, GroupId,
    PermissionGrants, Permissions, UnifiedEvent,
};
