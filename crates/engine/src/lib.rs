//! Feed decoding, permission reconciliation, reporting, and NDJSON output.

pub mod feed;
pub mod permissions;
pub mod reporter;
pub mod sink;

pub use feed::{decode, fetch_feed, parse_feed_id};
pub use ladok_core::levels::level_satisfies;
pub use permissions::{HeldGrants, PermissionReconciler, ReconcilerConfig};
pub use reporter::PermissionReport;
