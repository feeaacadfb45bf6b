use std::env;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use github::{GithubClient, GithubClientImpl, PackageScope};

mod github;

/// Delete GitHub container packages and package versions.
#[derive(Parser)]
#[clap(version)]
struct Args {
    /// Organization owning the packages. Without this flag the packages of
    /// the authenticated user are targeted.
    #[clap(long)]
    org: Option<String>,

    /// Path to a file containing a GitHub token.
    /// You can also pass a token verbatim via the GITHUB_TOKEN env variable.
    #[clap(long)]
    token: Option<String>,

    /// Base URL of the GitHub API (for GitHub Enterprise hosts)
    #[clap(long)]
    api_url: Option<String>,

    /// Give up after this many rate-limit retries per delete request
    /// instead of retrying indefinitely
    #[clap(long)]
    retry_cap: Option<u32>,

    /// Don't persist but only print changes
    #[clap(long, short = 'n')]
    dry_run: bool,

    /// Make logging more verbose.
    /// You can also specify the log level via the RUST_LOG env variable.
    #[clap(long, short)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Delete whole container packages
    Package {
        /// Packages to delete
        #[clap(required = true)]
        package_names: Vec<String>,
    },

    /// Delete a single version of a container package
    Version {
        /// Package the version belongs to
        package_name: String,

        /// Tag of the version to delete (conflicts with --version-id)
        #[clap(long, conflicts_with = "version_id")]
        tag: Option<String>,

        /// Version id to delete (conflicts with --tag)
        #[clap(long, conflicts_with = "tag")]
        version_id: Option<String>,
    },

    /// Look up a GitHub account
    User {
        /// Username to look up
        username: String,
    },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if env::var("RUST_LOG").is_err() {
        let level = match args.verbose {
            true => "debug",
            false => "info",
        };
        env::set_var("RUST_LOG", format!("{}={}", env!("CARGO_PKG_NAME"), level));
    }
    env_logger::init();

    log::info!(
        "Starting {} {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
    );
    log::debug!("With arguments {:?}", env::args().collect::<Vec<_>>());

    if let Err(error) = run(args).await {
        log::error!("{:?}", error);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let token = match args.token {
        Some(path) => tokio::fs::read_to_string(&path)
            .await
            .context(format!("Failed to read the github token from {}", path))?
            .trim()
            .to_string(),
        None => env::var("GITHUB_TOKEN")
            .context("No github token provided via --token or GITHUB_TOKEN")?,
    };

    let mut client = GithubClientImpl::new(token).context("Failed to create github client")?;
    if let Some(api_url) = args.api_url {
        client = client.with_api_root(api_url);
    }
    if let Some(cap) = args.retry_cap {
        client = client.with_retry_cap(cap);
    }

    let scope = PackageScope::new(args.org);

    match args.command {
        Command::Package { package_names } => {
            delete_packages(&client, &scope, &package_names, args.dry_run).await
        }
        Command::Version {
            package_name,
            tag,
            version_id,
        } => {
            delete_version(
                &client,
                &scope,
                &package_name,
                tag,
                version_id,
                args.dry_run,
            )
            .await
        }
        Command::User { username } => show_user(&client, &username).await,
    }
}

async fn delete_packages(
    client: &impl GithubClient,
    scope: &PackageScope,
    package_names: &[String],
    dry_run: bool,
) -> Result<()> {
    for package_name in package_names {
        let dry_run_suffix = match dry_run {
            true => " (DRY RUN)",
            false => "",
        };
        log::info!(
            "Deleting package {}/{}{}",
            scope,
            package_name,
            dry_run_suffix,
        );

        if dry_run {
            continue;
        }

        client
            .delete_package(scope, package_name)
            .await
            .context(format!(
                "Failed to delete package {}/{}",
                scope, package_name,
            ))?;
    }

    Ok(())
}

async fn delete_version(
    client: &impl GithubClient,
    scope: &PackageScope,
    package_name: &str,
    tag: Option<String>,
    version_id: Option<String>,
    dry_run: bool,
) -> Result<()> {
    let version_id = match (tag, version_id) {
        (Some(tag), None) => {
            let id = client
                .resolve_tag(scope, package_name, &tag)
                .await
                .context(format!(
                    "Failed to resolve tag {} of package {}/{}",
                    tag, scope, package_name,
                ))?;
            log::info!("Resolved tag {} to version id {}", tag, id);
            id
        }
        (None, Some(id)) => id,
        _ => bail!("Provide exactly one of --tag or --version-id"),
    };

    let dry_run_suffix = match dry_run {
        true => " (DRY RUN)",
        false => "",
    };
    log::info!(
        "Deleting version {} of package {}/{}{}",
        version_id,
        scope,
        package_name,
        dry_run_suffix,
    );

    if dry_run {
        return Ok(());
    }

    client
        .delete_package_version(scope, package_name, &version_id)
        .await
        .context(format!(
            "Failed to delete version {} of package {}/{}",
            version_id, scope, package_name,
        ))
}

async fn show_user(client: &impl GithubClient, username: &str) -> Result<()> {
    let user = client
        .get_user(username)
        .await
        .context(format!("Failed to look up user {}", username))?;

    println!("{} (id {}, {})", user.login, user.id, user.account_type);
    if let Some(name) = &user.name {
        println!("name: {}", name);
    }
    if let Some(company) = &user.company {
        println!("company: {}", company);
    }
    if let Some(location) = &user.location {
        println!("location: {}", location);
    }
    println!(
        "repos: {}, gists: {}, followers: {}, following: {}",
        user.public_repos, user.public_gists, user.followers, user.following,
    );
    println!("created: {}, updated: {}", user.created_at, user.updated_at);
    if let Some(plan) = &user.plan {
        println!(
            "plan: {} (space {}, collaborators {}, private repos {})",
            plan.name, plan.space, plan.collaborators, plan.private_repos,
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use mockall::predicate::*;

    use super::*;
    use crate::github::MockGithubClient;

    #[tokio::test]
    async fn test_delete_packages() {
        let mut client = MockGithubClient::new();

        let scope = PackageScope::Organization("acme".to_string());
        let names = vec!["app".to_string(), "worker".to_string()];

        // A dry run issues no requests.
        delete_packages(&client, &scope, &names, true)
            .await
            .unwrap();

        client
            .expect_delete_package()
            .with(eq(scope.clone()), eq("app"))
            .times(1)
            .returning(|_, _| Ok(()));
        client
            .expect_delete_package()
            .with(eq(scope.clone()), eq("worker"))
            .times(1)
            .returning(|_, _| Ok(()));
        delete_packages(&client, &scope, &names, false)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_version_by_tag() {
        let mut client = MockGithubClient::new();
        let scope = PackageScope::User;

        client
            .expect_resolve_tag()
            .with(eq(scope.clone()), eq("app"), eq("v1.2"))
            .times(1)
            .returning(|_, _, _| Ok("42".to_string()));
        client
            .expect_delete_package_version()
            .with(eq(scope.clone()), eq("app"), eq("42"))
            .times(1)
            .returning(|_, _, _| Ok(()));

        delete_version(
            &client,
            &scope,
            "app",
            Some("v1.2".to_string()),
            None,
            false,
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_delete_version_by_id_dry_run() {
        let client = MockGithubClient::new();

        // Neither resolution nor deletion happens on a dry run with an
        // explicit version id.
        delete_version(
            &client,
            &PackageScope::User,
            "app",
            None,
            Some("42".to_string()),
            true,
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_delete_version_rejects_ambiguous_selector() {
        let client = MockGithubClient::new();

        let result = delete_version(&client, &PackageScope::User, "app", None, None, false).await;
        assert!(result.is_err());
    }
}
