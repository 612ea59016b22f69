use async_trait::async_trait;

use super::errors::Result;

/// A repository created on the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedRepo {
    /// Full `namespace/name` path on the destination.
    pub full_name: String,
}

/// Operations the pipeline needs from the destination hosting platform.
///
/// Implementations perform the raw call only. Rate limiting, deadlines and
/// cancellation are applied by the caller so they are uniform across
/// implementations.
#[async_trait]
pub trait DestinationApi: Send + Sync {
    /// Create an organization with `admin` as its owner.
    async fn create_organization(&self, name: &str, admin: &str) -> Result<()>;

    /// Create a repository inside `org`, or in the authenticated account's
    /// own namespace when `org` is `None`.
    async fn create_repository(&self, org: Option<&str>, name: &str) -> Result<CreatedRepo>;
}
