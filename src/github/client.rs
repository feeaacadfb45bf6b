use std::fmt::Display;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, ACCEPT, AUTHORIZATION, RETRY_AFTER, USER_AGENT},
    Client, ClientBuilder, Method, StatusCode,
};
use serde::de::DeserializeOwned;

use super::{GithubClient, GithubError, PackageVersion, User};

const DEFAULT_API_ROOT: &str = "https://api.github.com";
const PER_PAGE: u32 = 100;
const ACCEPTED_STATUS: [StatusCode; 3] = [
    StatusCode::OK,
    StatusCode::ACCEPTED,
    StatusCode::NO_CONTENT,
];

/// Who owns the container packages being operated on. The user variant
/// addresses the packages of the authenticated user and therefore carries
/// no name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageScope {
    User,
    Organization(String),
}

impl PackageScope {
    pub fn new(org: Option<String>) -> Self {
        match org {
            Some(org) => Self::Organization(org),
            None => Self::User,
        }
    }

    fn base_url(&self) -> String {
        match self {
            Self::User => "user".to_string(),
            Self::Organization(org) => format!("orgs/{org}"),
        }
    }
}

impl Display for PackageScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Organization(org) => f.write_str(org),
        }
    }
}

pub struct GithubClientImpl {
    client: Client,
    api_root: String,
    retry_cap: Option<u32>,
}

impl GithubClientImpl {
    pub fn new(token: impl AsRef<str>) -> Result<Self> {
        let user_agent = format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        log::debug!("{}: {}", USER_AGENT.as_str(), user_agent);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, "application/vnd.github.v3+json".try_into()?);
        headers.insert(
            AUTHORIZATION,
            format!("Bearer {}", token.as_ref()).try_into()?,
        );
        headers.insert(USER_AGENT, user_agent.try_into()?);

        let client = ClientBuilder::new().default_headers(headers).build()?;
        Ok(Self {
            client,
            api_root: DEFAULT_API_ROOT.to_string(),
            retry_cap: None,
        })
    }

    /// Point the client at a different API host (GitHub Enterprise).
    pub fn with_api_root(mut self, api_root: impl Into<String>) -> Self {
        self.api_root = api_root.into().trim_end_matches('/').to_string();
        self
    }

    /// Cap the number of rate-limit retries per delete request. Without a
    /// cap the client keeps retrying as long as the server keeps answering
    /// 403 with a Retry-After header, matching the upstream contract.
    pub fn with_retry_cap(mut self, cap: u32) -> Self {
        self.retry_cap = Some(cap);
        self
    }

    /// Send a request and return the body if the status is one of 200, 202
    /// or 204. Any other status is surfaced as a Status error carrying the
    /// parsed Retry-After header, if present.
    async fn execute(&self, method: Method, url: String) -> Result<String, GithubError> {
        let response = self
            .client
            .request(method, &url)
            .send()
            .await
            .map_err(|source| GithubError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok());
        let body = response
            .text()
            .await
            .map_err(|source| GithubError::Transport {
                url: url.clone(),
                source,
            })?;

        if !ACCEPTED_STATUS.contains(&status) {
            return Err(GithubError::Status {
                url,
                status,
                retry_after,
                body,
            });
        }

        Ok(body)
    }

    async fn resolve_tag_in_pages(
        &self,
        versions_url: &str,
        tag: &str,
    ) -> Result<String, GithubError> {
        let mut page = 0;
        loop {
            let page_url = format!("{versions_url}?page={page}&per_page={PER_PAGE}");
            let body = self.execute(Method::GET, page_url).await?;
            let versions: Vec<PackageVersion> = parse_json(&body)?;

            if versions.is_empty() {
                break;
            }

            if let Some(id) = find_tag(&versions, tag) {
                return Ok(id.to_string());
            }

            page += 1;
        }

        Err(GithubError::TagNotFound {
            tag: tag.to_string(),
        })
    }

    async fn delete_resource(&self, url: String) -> Result<(), GithubError> {
        let mut attempts = 0;
        loop {
            let error = match self.execute(Method::DELETE, url.clone()).await {
                Ok(_) => return Ok(()),
                Err(error) => error,
            };

            // Secondary rate limit: 403 plus an integer Retry-After header.
            // Anything else is not retried.
            let seconds = match &error {
                GithubError::Status {
                    status,
                    retry_after: Some(seconds),
                    ..
                } if *status == StatusCode::FORBIDDEN => *seconds,
                _ => return Err(error),
            };

            attempts += 1;
            if let Some(cap) = self.retry_cap {
                if attempts > cap {
                    return Err(error);
                }
            }

            log::warn!(
                "Secondary rate limit hit, waiting {}s before retrying delete of {}",
                seconds,
                url,
            );
            tokio::time::sleep(Duration::from_secs(seconds)).await;
        }
    }
}

#[async_trait]
impl GithubClient for GithubClientImpl {
    async fn get_user(&self, username: &str) -> Result<User, GithubError> {
        let url = format!("{}/users/{}", self.api_root, username);
        let body = self.execute(Method::GET, url).await?;
        parse_json(&body)
    }

    async fn resolve_tag(
        &self,
        scope: &PackageScope,
        package_name: &str,
        tag: &str,
    ) -> Result<String, GithubError> {
        let url = format!(
            "{}/{}/packages/container/{}/versions",
            self.api_root,
            scope.base_url(),
            package_name,
        );
        self.resolve_tag_in_pages(&url, tag).await
    }

    async fn delete_package(
        &self,
        scope: &PackageScope,
        package_name: &str,
    ) -> Result<(), GithubError> {
        let url = format!(
            "{}/{}/packages/container/{}",
            self.api_root,
            scope.base_url(),
            package_name,
        );
        self.delete_resource(url).await
    }

    async fn delete_package_version(
        &self,
        scope: &PackageScope,
        package_name: &str,
        version_id: &str,
    ) -> Result<(), GithubError> {
        let url = format!(
            "{}/{}/packages/container/{}/versions/{}",
            self.api_root,
            scope.base_url(),
            package_name,
            version_id,
        );
        self.delete_resource(url).await
    }
}

fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T, GithubError> {
    serde_json::from_str(body).map_err(|source| GithubError::Parse {
        body: body.to_string(),
        source,
    })
}

/// First version whose tag list contains an exact match, in list order.
fn find_tag(versions: &[PackageVersion], tag: &str) -> Option<u64> {
    versions
        .iter()
        .find(|version| version.metadata.container.tags.iter().any(|t| t == tag))
        .map(|version| version.id)
}
