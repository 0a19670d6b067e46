//! `idpscim`: one sync run from a directory export into a SCIM service.
//!
//! # Usage
//!
//! ```text
//! idpscim --directory export.json --scim-endpoint https://scim.example.com \
//!   --scim-access-token $TOKEN --groups-filter 'eng*'
//! idpscim --config ~/.config/idpscim/config.toml
//! ```

mod directory;
mod settings;

use anyhow::Context as _;
use clap::Parser;
use idpscim_core::{SyncReport, SyncService};
use idpscim_scim::ScimClient;
use idpscim_store_disk::DiskStateRepository;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

use directory::DirectoryProvider;
use settings::{Args, Settings, SyncMethod};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();
  let settings = Settings::load(&args).context("failed to load configuration")?;

  let provider = DirectoryProvider::load(&settings.directory)
    .await
    .with_context(|| {
      format!("failed to load directory export {}", settings.directory.display())
    })?;
  let scim = ScimClient::new(&settings.scim_config())
    .context("failed to build SCIM client")?;
  let repository = DiskStateRepository::new(&settings.state_path);

  let service =
    SyncService::new(provider, scim, repository, settings.sync_options());

  let report = match settings.sync_method {
    SyncMethod::Groups => service.sync_groups_and_their_members().await,
    SyncMethod::Users => service.sync_groups_and_users().await,
  }
  .context("sync failed")?;

  log_report(&report);
  Ok(())
}

fn log_report(report: &SyncReport) {
  info!(
    phase = ?report.phase,
    groups = ?report.groups,
    users = ?report.users,
    members = ?report.members,
    state = %report.location,
    hash = %report.state_hash,
    "sync finished"
  );
}
