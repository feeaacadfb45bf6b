use serde::{Deserialize, Serialize};

/// A GitHub account as returned by `GET /users/{username}`.
///
/// Profile fields are nullable in the API and map to `Option`s here.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub login: String,
    pub id: u64,
    pub node_id: String,
    pub avatar_url: String,
    pub url: String,
    pub html_url: String,
    #[serde(rename = "type")]
    pub account_type: String,
    pub site_admin: bool,
    pub name: Option<String>,
    pub company: Option<String>,
    pub blog: Option<String>,
    pub location: Option<String>,
    pub email: Option<String>,
    pub hireable: Option<bool>,
    pub bio: Option<String>,
    pub twitter_username: Option<String>,
    pub public_repos: u64,
    pub public_gists: u64,
    pub followers: u64,
    pub following: u64,
    pub created_at: String,
    pub updated_at: String,
    pub plan: Option<UserPlan>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserPlan {
    pub name: String,
    pub space: u64,
    pub collaborators: u64,
    pub private_repos: u64,
}

/// One version of a container package, as listed by the versions endpoint.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PackageVersion {
    pub id: u64,
    pub name: String,
    pub url: String,
    pub package_html_url: String,
    pub html_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub metadata: PackageVersionMetadata,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PackageVersionMetadata {
    pub package_type: String,
    pub container: ContainerVersionMetadata,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ContainerVersionMetadata {
    pub tags: Vec<String>,
}
