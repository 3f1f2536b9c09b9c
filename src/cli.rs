//! CLI definition using clap.

use std::path::PathBuf;

use clap::Parser;
use clap::builder::BoolishValueParser;
use url::Url;

use crate::github::DEFAULT_API_URL;

/// rostersync - GitHub team roster reconciliation
#[derive(Parser, Debug, Clone)]
#[command(name = "rostersync")]
#[command(version)]
#[command(about = "Reconcile GitHub team rosters against declarative YAML membership files")]
#[command(
    long_about = "rostersync reads one `<family>.yaml` file per team family, mapping GitHub handles to `member` or `maintainer`, and makes the family's team and approvers team match it. Org admins are always kept as maintainers."
)]
pub struct Cli {
    /// Directory holding one `<family>.yaml` membership file per team family
    #[arg(long, env = "ROSTERSYNC_CONFIG_DIR", default_value = "readability")]
    pub config_dir: PathBuf,

    /// TOML settings file (org, ignored admins, team suffixes, concurrency)
    #[arg(long, env = "ROSTERSYNC_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Organization owning the teams, overriding the settings file
    #[arg(long, env = "ROSTERSYNC_ORG")]
    pub org: Option<String>,

    /// Token used to authenticate every API call
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// GitHub REST API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: Url,

    /// Report planned changes without applying them
    #[arg(long, env = "DRY_RUN", value_parser = env_switch())]
    pub dry_run: bool,

    /// Enable debug logging
    #[arg(long, env = "DEBUG", value_parser = env_switch())]
    pub debug: bool,

    /// Number of team families synchronized at once
    #[arg(long, env = "ROSTERSYNC_MAX_CONCURRENT_GROUPS", default_value_t = 1)]
    pub max_concurrent_groups: usize,
}

/// Parser for switches that may also be set from the environment.
///
/// Accepts `1`/`0`, `t`/`f`, `true`/`false`, `yes`/`no` and `on`/`off`, in any case.
fn env_switch() -> BoolishValueParser {
    BoolishValueParser::new()
}
