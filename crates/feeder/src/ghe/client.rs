//! GitHub Enterprise client implementing [`DestinationApi`].

use async_trait::async_trait;
use octocrab::Octocrab;
use serde::Serialize;

use super::error::to_api_error;
use crate::platform::{ApiError, CreatedRepo, DestinationApi, Result};

/// Body of `POST /admin/organizations`.
#[derive(Debug, Serialize)]
struct CreateOrgRequest<'a> {
    login: &'a str,
    admin: &'a str,
}

/// Body of `POST /orgs/{org}/repos` and `POST /user/repos`.
#[derive(Debug, Serialize)]
struct CreateRepoRequest<'a> {
    name: &'a str,
}

/// Destination client for a GitHub Enterprise Server instance.
#[derive(Clone)]
pub struct GheClient {
    client: Octocrab,
}

impl GheClient {
    /// Create a client for the API rooted at `api_url`
    /// (e.g. `https://ghe.example.com/api/v3`).
    pub fn new(api_url: &str, token: &str) -> Result<Self> {
        let client = Octocrab::builder()
            .base_uri(api_url)
            .map_err(to_api_error)?
            .personal_token(token.to_string())
            .build()
            .map_err(to_api_error)?;

        Ok(Self { client })
    }
}

impl std::fmt::Debug for GheClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GheClient").finish_non_exhaustive()
    }
}

/// API route for creating a repository in `org`, or in the user's namespace.
pub(crate) fn create_repo_route(org: Option<&str>) -> String {
    match org {
        Some(org) => format!("/orgs/{org}/repos"),
        None => "/user/repos".to_string(),
    }
}

#[async_trait]
impl DestinationApi for GheClient {
    async fn create_organization(&self, name: &str, admin: &str) -> Result<()> {
        let body = CreateOrgRequest { login: name, admin };
        let _created: serde_json::Value = self
            .client
            .post("/admin/organizations", Some(&body))
            .await
            .map_err(to_api_error)?;

        tracing::debug!(org = name, admin, "Created organization");
        Ok(())
    }

    async fn create_repository(&self, org: Option<&str>, name: &str) -> Result<CreatedRepo> {
        let body = CreateRepoRequest { name };
        let repo: octocrab::models::Repository = self
            .client
            .post(create_repo_route(org), Some(&body))
            .await
            .map_err(to_api_error)?;

        let full_name = repo
            .full_name
            .ok_or_else(|| ApiError::internal(format!("created repo {name} has no full_name")))?;

        tracing::debug!(repo = %full_name, "Created repository");
        Ok(CreatedRepo { full_name })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_repo_route_for_org() {
        assert_eq!(
            create_repo_route(Some("brave-turing-42")),
            "/orgs/brave-turing-42/repos"
        );
    }

    #[test]
    fn create_repo_route_for_default_namespace() {
        assert_eq!(create_repo_route(None), "/user/repos");
    }

    #[test]
    fn request_bodies_serialize_expected_fields() {
        let org = serde_json::to_value(CreateOrgRequest {
            login: "brave-turing-42",
            admin: "ghe-admin",
        })
        .unwrap();
        assert_eq!(
            org,
            serde_json::json!({"login": "brave-turing-42", "admin": "ghe-admin"})
        );

        let repo = serde_json::to_value(CreateRepoRequest {
            name: "octocat-hello",
        })
        .unwrap();
        assert_eq!(repo, serde_json::json!({"name": "octocat-hello"}));
    }

    #[tokio::test]
    async fn new_rejects_invalid_api_url() {
        assert!(GheClient::new("not a url", "token").is_err());
    }
}
