//! Command-line flags and layered settings.
//!
//! Precedence, lowest first: built-in defaults, the TOML file given with
//! `--config`, `IDPSCIM_*` environment variables, command-line flags.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use clap::{Parser, ValueEnum};
use config::{Config, ConfigError, Environment, File, FileFormat};
use idpscim_core::SyncOptions;
use idpscim_scim::ScimConfig;
use serde::Deserialize;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
  name = "idpscim",
  version,
  about = "Sync identity provider groups and users into a SCIM service"
)]
pub struct Args {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE")]
  pub config: Option<PathBuf>,

  /// Where the sync state is kept between runs.
  #[arg(long, value_name = "FILE")]
  pub state_path: Option<PathBuf>,

  /// JSON export of the identity provider directory.
  #[arg(long, value_name = "FILE")]
  pub directory: Option<PathBuf>,

  /// Base URL of the SCIM service.
  #[arg(long, value_name = "URL")]
  pub scim_endpoint: Option<String>,

  /// Bearer token for the SCIM service.
  #[arg(long, value_name = "TOKEN")]
  pub scim_access_token: Option<String>,

  /// Group name pattern; a trailing `*` matches any suffix. Repeatable.
  #[arg(long, value_name = "PATTERN")]
  pub groups_filter: Vec<String>,

  /// User email pattern; a trailing `*` matches any suffix. Repeatable.
  #[arg(long, value_name = "PATTERN")]
  pub users_filter: Vec<String>,

  #[arg(long, value_enum)]
  pub sync_method: Option<SyncMethod>,
}

/// Which users a run syncs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SyncMethod {
  /// Only users that are members of the synced groups.
  #[default]
  Groups,
  /// Users matching the user filter, independently of group membership.
  Users,
}

impl SyncMethod {
  fn as_str(self) -> &'static str {
    match self {
      Self::Groups => "groups",
      Self::Users => "users",
    }
  }
}

// ─── Settings ────────────────────────────────────────────────────────────────

/// Fully resolved runtime settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  pub state_path:        PathBuf,
  pub directory:         PathBuf,
  pub scim_endpoint:     String,
  pub scim_access_token: String,
  pub scim_timeout_secs: u64,
  pub scim_page_size:    usize,
  #[serde(default)]
  pub groups_filter:     Vec<String>,
  #[serde(default)]
  pub users_filter:      Vec<String>,
  pub sync_method:       SyncMethod,
}

impl Settings {
  /// Resolve settings from `args`, its config file, and the process
  /// environment.
  pub fn load(args: &Args) -> Result<Self, ConfigError> {
    Self::load_with_env(args, Environment::with_prefix("IDPSCIM"))
  }

  fn load_with_env(args: &Args, env: Environment) -> Result<Self, ConfigError> {
    let mut builder = Config::builder()
      .set_default("state_path", "state.json")?
      .set_default("scim_timeout_secs", 30)?
      .set_default("scim_page_size", 100)?
      .set_default("sync_method", SyncMethod::default().as_str())?;

    if let Some(path) = &args.config {
      builder = builder.add_source(File::from(path.as_path()).format(FileFormat::Toml));
    }

    let settings: Self = builder
      .add_source(
        env
          .try_parsing(true)
          .list_separator(",")
          .with_list_parse_key("groups_filter")
          .with_list_parse_key("users_filter"),
      )
      .set_override_option("state_path", args.state_path.as_deref().map(path_str))?
      .set_override_option("directory", args.directory.as_deref().map(path_str))?
      .set_override_option("scim_endpoint", args.scim_endpoint.clone())?
      .set_override_option("scim_access_token", args.scim_access_token.clone())?
      .set_override_option("groups_filter", non_empty(&args.groups_filter))?
      .set_override_option("users_filter", non_empty(&args.users_filter))?
      .set_override_option("sync_method", args.sync_method.map(SyncMethod::as_str))?
      .build()?
      .try_deserialize()?;

    Ok(Self {
      state_path: expand_tilde(&settings.state_path),
      directory: expand_tilde(&settings.directory),
      ..settings
    })
  }

  pub fn scim_config(&self) -> ScimConfig {
    ScimConfig {
      endpoint:     self.scim_endpoint.clone(),
      access_token: self.scim_access_token.clone(),
      timeout:      Duration::from_secs(self.scim_timeout_secs),
      page_size:    self.scim_page_size,
    }
  }

  pub fn sync_options(&self) -> SyncOptions {
    SyncOptions {
      groups_filter: self.groups_filter.clone(),
      users_filter: self.users_filter.clone(),
      ..SyncOptions::default()
    }
  }
}

fn path_str(path: &Path) -> String { path.to_string_lossy().into_owned() }

fn non_empty(values: &[String]) -> Option<Vec<String>> {
  (!values.is_empty()).then(|| values.to_vec())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
