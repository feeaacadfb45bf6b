use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

mod api;
mod client;
mod error;

pub use api::{ContainerVersionMetadata, PackageVersion, PackageVersionMetadata, User, UserPlan};
pub use client::{GithubClientImpl, PackageScope};
pub use error::GithubError;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait GithubClient {
    /// Look up a GitHub account by username.
    async fn get_user(&self, username: &str) -> Result<User, GithubError>;

    /// Resolve a container image tag to its package version id by walking
    /// the version listing page by page.
    async fn resolve_tag(
        &self,
        scope: &PackageScope,
        package_name: &str,
        tag: &str,
    ) -> Result<String, GithubError>;

    /// Delete a whole container package.
    async fn delete_package(
        &self,
        scope: &PackageScope,
        package_name: &str,
    ) -> Result<(), GithubError>;

    /// Delete a single version of a container package.
    async fn delete_package_version(
        &self,
        scope: &PackageScope,
        package_name: &str,
        version_id: &str,
    ) -> Result<(), GithubError>;
}
