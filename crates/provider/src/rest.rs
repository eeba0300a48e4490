//! REST provider over [`HttpTransport`].

use crate::transport::{Format, HttpTransport, Service, TransportConfig};
use crate::{FeedSelector, LadokProvider};
use async_trait::async_trait;
use ladok_core::types::{HeldPermissionsDocument, PermissionProfileDocument};
use ladok_core::{ActivityGrant, FeedDocument, GroupId, TransportError};
use reqwest::Method;

const HELD_GROUPS_PATH: &str = "kataloginformation/anvandarbehorighet/egna";
const PROFILE_PATH: &str = "kataloginformation/behorighetsprofil";

/// Fetches feeds and permission data from a Ladok deployment.
///
/// ```ignore
/// let provider = RestProvider::new(&TransportConfig::new(url).with_identity(p12, pw))?;
/// let groups = provider.fetch_held_permission_groups().await?;
/// ```
#[derive(Debug, Clone)]
pub struct RestProvider {
    transport: HttpTransport,
}

impl RestProvider {
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        Ok(Self::from_transport(HttpTransport::new(config)?))
    }

    pub fn from_transport(transport: HttpTransport) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }
}

#[async_trait]
impl LadokProvider for RestProvider {
    async fn fetch_feed(&self, selector: FeedSelector) -> Result<FeedDocument, TransportError> {
        let path = format!("{}/{selector}", self.transport.environment().feed_path());

        tracing::debug!(%selector, path, "fetching feed");

        self.transport
            .call(
                Method::GET,
                &path,
                &Service::Uppfoljning.accept(Format::Xml),
                None,
            )
            .await
    }

    async fn fetch_held_permission_groups(&self) -> Result<Vec<GroupId>, TransportError> {
        let doc: HeldPermissionsDocument = self
            .transport
            .call(
                Method::GET,
                HELD_GROUPS_PATH,
                &Service::Kataloginformation.accept(Format::Json),
                None,
            )
            .await?;

        let groups = doc.group_ids();
        tracing::debug!(groups = groups.len(), "fetched held permission groups");
        Ok(groups)
    }

    async fn fetch_permission_group_definition(
        &self,
        group: &GroupId,
    ) -> Result<Vec<ActivityGrant>, TransportError> {
        let path = format!("{PROFILE_PATH}/{group}");
        let doc: PermissionProfileDocument = self
            .transport
            .call(
                Method::GET,
                &path,
                &Service::Kataloginformation.accept(Format::Json),
                None,
            )
            .await?;

        tracing::debug!(
            %group,
            activities = doc.systemaktiviteter.len(),
            "fetched permission profile"
        );
        Ok(doc.systemaktiviteter)
    }
}
