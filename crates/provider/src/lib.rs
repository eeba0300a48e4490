//! Data access layer for the Ladok client.

pub mod activities;
pub mod rest;
pub mod transport;

use async_trait::async_trait;
use ladok_core::{ActivityGrant, FeedDocument, GroupId, TransportError};
use std::fmt;

pub use rest::RestProvider;
pub use transport::{Environment, HttpTransport, TransportConfig};

/// Which feed page to retrieve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedSelector {
    Recent,
    First,
    Historical(u64),
}

impl fmt::Display for FeedSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedSelector::Recent => f.write_str("recent"),
            FeedSelector::First => f.write_str("first"),
            FeedSelector::Historical(id) => write!(f, "{id}"),
        }
    }
}

/// Abstraction over the remote calls the engine needs.
///
/// Failures are returned as the transport reported them; callers decide
/// how to wrap them.
#[async_trait]
pub trait LadokProvider: Send + Sync {
    async fn fetch_feed(&self, selector: FeedSelector) -> Result<FeedDocument, TransportError>;

    /// Permission groups the authenticated caller belongs to (`egna`).
    async fn fetch_held_permission_groups(&self) -> Result<Vec<GroupId>, TransportError>;

    /// Activity levels defined by one permission group (`behorighetsprofil`).
    async fn fetch_permission_group_definition(
        &self,
        group: &GroupId,
    ) -> Result<Vec<ActivityGrant>, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_path_segments() {
        assert_eq!(FeedSelector::Recent.to_string(), "recent");
        assert_eq!(FeedSelector::First.to_string(), "first");
        assert_eq!(FeedSelector::Historical(4015).to_string(), "4015");
    }
}
