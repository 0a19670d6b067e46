//! The sync orchestrator.
//!
//! One run fetches the provider's groups, users and memberships, compares
//! them with either the live SCIM data (first run) or the last stored state,
//! applies the resulting operations through the SCIM service, and stores the
//! merged totals as the new state.
//!
//! A failure aborts the run immediately. Changes already applied to the
//! target are not rolled back, and no state is stored, so the previous
//! state stays authoritative for the next attempt.

use std::collections::HashSet;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  error::Stage,
  model::{
    Group, GroupMembers, GroupsMembersResult, GroupsResult, Member, State,
    UsersResult,
  },
  operations::{groups_operations, members_operations, users_operations},
  reconcile::{
    fold_groups_members, merge_groups_members_result, merge_groups_result,
    merge_users_result, update_groups_members_scimid,
  },
  service::{IdentityProviderService, ScimService, StateRepository},
};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Provider filters and metadata for a [`SyncService`].
#[derive(Debug, Clone)]
pub struct SyncOptions {
  pub groups_filter: Vec<String>,
  pub users_filter:  Vec<String>,
  /// Recorded in every stored state.
  pub code_version:  String,
}

impl Default for SyncOptions {
  fn default() -> Self {
    Self {
      groups_filter: vec![],
      users_filter:  vec![],
      code_version:  env!("CARGO_PKG_VERSION").to_owned(),
    }
  }
}

// ─── Reporting ───────────────────────────────────────────────────────────────

/// Where a sync run is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
  NotInitialized,
  /// No usable state: compare against live SCIM data.
  FirstRunReconcile,
  /// Compare against the last stored state.
  SteadyStateReconcile,
  Persisted,
}

/// What a run did to one resource type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeCounts {
  pub created:   usize,
  pub updated:   usize,
  pub deleted:   usize,
  pub unchanged: usize,
  /// The provider data matched the stored state; nothing was compared.
  pub skipped:   bool,
}

impl ChangeCounts {
  fn skipped(unchanged: usize) -> Self {
    Self {
      unchanged,
      skipped: true,
      ..Self::default()
    }
  }
}

/// Outcome of a successful sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
  /// The reconcile phase the run went through.
  pub phase:      SyncPhase,
  pub groups:     ChangeCounts,
  pub users:      ChangeCounts,
  pub members:    ChangeCounts,
  pub state_hash: String,
  pub location:   String,
}

/// Provider-side data for one run.
struct Snapshot {
  groups:         GroupsResult,
  users:          UsersResult,
  groups_members: GroupsMembersResult,
}

/// Totals to persist, with per-resource counts.
struct Totals {
  groups:         (GroupsResult, ChangeCounts),
  users:          (UsersResult, ChangeCounts),
  groups_members: (GroupsMembersResult, ChangeCounts),
}

// ─── Service ─────────────────────────────────────────────────────────────────

/// Drives sync runs between an identity provider and a SCIM target.
///
/// Public entry points are serialised: a second call waits for the first
/// to finish rather than interleaving with it.
pub struct SyncService<P, S, R> {
  provider:   P,
  scim:       S,
  repository: R,
  options:    SyncOptions,
  lock:       Mutex<()>,
}

impl<P, S, R> SyncService<P, S, R>
where
  P: IdentityProviderService,
  S: ScimService,
  R: StateRepository,
{
  pub fn new(provider: P, scim: S, repository: R, options: SyncOptions) -> Self {
    Self {
      provider,
      scim,
      repository,
      options,
      lock: Mutex::new(()),
    }
  }

  pub fn provider(&self) -> &P { &self.provider }

  pub fn scim(&self) -> &S { &self.scim }

  pub fn repository(&self) -> &R { &self.repository }

  /// Sync the filtered groups, their members, and only the users that are
  /// members of those groups.
  pub async fn sync_groups_and_their_members(&self) -> Result<SyncReport> {
    let _guard = self.lock.lock().await;
    info!(groups_filter = ?self.options.groups_filter, "syncing groups and their members");

    let groups = self.provider_groups().await?;
    let groups_members = self.provider_groups_members(&groups).await?;
    let users = self
      .provider
      .get_users_by_groups_members(&groups_members)
      .await
      .map_err(Error::collaborator(Stage::ProviderGetUsersByGroupsMembers))?;

    self
      .run(Snapshot {
        groups,
        users,
        groups_members,
      })
      .await
  }

  /// Sync the filtered groups and the filtered users independently.
  ///
  /// Memberships that reference a user outside the user filter are dropped.
  pub async fn sync_groups_and_users(&self) -> Result<SyncReport> {
    let _guard = self.lock.lock().await;
    info!(
      groups_filter = ?self.options.groups_filter,
      users_filter = ?self.options.users_filter,
      "syncing groups and users"
    );

    let groups = self.provider_groups().await?;
    let users = self
      .provider
      .get_users(&self.options.users_filter)
      .await
      .map_err(Error::collaborator(Stage::ProviderGetUsers))?;
    let groups_members = self.provider_groups_members(&groups).await?;
    let groups_members = retain_known_members(&groups_members, &users);

    self
      .run(Snapshot {
        groups,
        users,
        groups_members,
      })
      .await
  }

  // ── Provider reads ────────────────────────────────────────────────────

  async fn provider_groups(&self) -> Result<GroupsResult> {
    let groups = self
      .provider
      .get_groups(&self.options.groups_filter)
      .await
      .map_err(Error::collaborator(Stage::ProviderGetGroups))?;
    Ok(dedup_groups_by_name(groups))
  }

  async fn provider_groups_members(
    &self,
    groups: &GroupsResult,
  ) -> Result<GroupsMembersResult> {
    let mut out: Vec<GroupMembers> = Vec::with_capacity(groups.items());
    for group in groups {
      let members = self
        .provider
        .get_group_members(&group.ipid)
        .await
        .map_err(Error::collaborator(Stage::ProviderGetGroupMembers))?;
      debug!(group = %group.name, members = members.items(), "fetched group members");
      out.push(
        GroupMembers::builder()
          .with_group(group.clone())
          .with_resources(members.into_resources())
          .build(),
      );
    }
    Ok(out.into())
  }

  // ── Run ───────────────────────────────────────────────────────────────

  async fn run(&self, idp: Snapshot) -> Result<SyncReport> {
    info!(
      phase = ?SyncPhase::NotInitialized,
      groups = idp.groups.items(),
      users = idp.users.items(),
      groups_members = idp.groups_members.items(),
      "fetched identity provider data"
    );

    let state = self
      .repository
      .get_state()
      .await
      .map_err(Error::collaborator(Stage::GetState))?
      .filter(State::is_initialized);

    let (phase, totals) = match state {
      None => {
        info!(phase = ?SyncPhase::FirstRunReconcile, "no stored state, reconciling against the SCIM service");
        (SyncPhase::FirstRunReconcile, self.first_run(&idp).await?)
      }
      Some(state) => {
        info!(
          phase = ?SyncPhase::SteadyStateReconcile,
          last_sync = ?state.last_sync,
          "reconciling against stored state"
        );
        (
          SyncPhase::SteadyStateReconcile,
          self.steady_state(&idp, &state).await?,
        )
      }
    };

    let Totals {
      groups: (groups, group_counts),
      users: (users, user_counts),
      groups_members: (groups_members, member_counts),
    } = totals;

    let state = State::builder()
      .with_code_version(&self.options.code_version)
      .with_last_sync(Utc::now())
      .with_groups(groups)
      .with_users(users)
      .with_groups_members(groups_members)
      .build();

    let stored = self
      .repository
      .store_state(&state)
      .await
      .map_err(Error::collaborator(Stage::StoreState))?;

    info!(
      phase = ?SyncPhase::Persisted,
      location = %stored.location,
      hash = %state.hash_code,
      "stored state"
    );

    Ok(SyncReport {
      phase,
      groups: group_counts,
      users: user_counts,
      members: member_counts,
      state_hash: state.hash_code,
      location: stored.location,
    })
  }

  async fn first_run(&self, idp: &Snapshot) -> Result<Totals> {
    let scim_groups = self
      .scim
      .get_groups()
      .await
      .map_err(Error::collaborator(Stage::ScimGetGroups))?;
    let scim_users = self
      .scim
      .get_users()
      .await
      .map_err(Error::collaborator(Stage::ScimGetUsers))?;
    let scim_groups_members = self
      .scim
      .get_groups_members(&scim_groups, &scim_users)
      .await
      .map_err(Error::collaborator(Stage::ScimGetGroupsMembers))?;

    info!(
      groups = scim_groups.items(),
      users = scim_users.items(),
      groups_members = scim_groups_members.items(),
      "fetched SCIM data"
    );

    let groups = self.reconcile_groups(&idp.groups, &scim_groups).await?;
    let users = self.reconcile_users(&idp.users, &scim_users).await?;
    let groups_members = self
      .reconcile_members(&idp.groups_members, &groups.0, &users.0, &scim_groups_members)
      .await?;

    Ok(Totals {
      groups,
      users,
      groups_members,
    })
  }

  async fn steady_state(&self, idp: &Snapshot, state: &State) -> Result<Totals> {
    let stored = &state.resources;

    let groups = if idp.groups.hash_code() == stored.groups.hash_code() {
      info!("groups unchanged since last sync, skipping");
      (stored.groups.clone(), ChangeCounts::skipped(stored.groups.items()))
    } else {
      self.reconcile_groups(&idp.groups, &stored.groups).await?
    };

    let users = if idp.users.hash_code() == stored.users.hash_code() {
      info!("users unchanged since last sync, skipping");
      (stored.users.clone(), ChangeCounts::skipped(stored.users.items()))
    } else {
      self.reconcile_users(&idp.users, &stored.users).await?
    };

    let groups_members =
      if idp.groups_members.hash_code() == stored.groups_members.hash_code() {
        info!("groups members unchanged since last sync, skipping");
        (
          stored.groups_members.clone(),
          ChangeCounts::skipped(member_count(&stored.groups_members)),
        )
      } else {
        self
          .reconcile_members(&idp.groups_members, &groups.0, &users.0, &stored.groups_members)
          .await?
      };

    Ok(Totals {
      groups,
      users,
      groups_members,
    })
  }

  // ── Reconcile + apply ─────────────────────────────────────────────────

  async fn reconcile_groups(
    &self,
    idp: &GroupsResult,
    comparison: &GroupsResult,
  ) -> Result<(GroupsResult, ChangeCounts)> {
    let ops = groups_operations(Some(idp), Some(comparison))?;
    info!(
      create = ops.create.items(),
      update = ops.update.items(),
      equal = ops.equal.items(),
      delete = ops.delete.items(),
      "reconciling groups"
    );

    let created = if ops.create.is_empty() {
      GroupsResult::default()
    } else {
      self
        .scim
        .create_groups(&ops.create)
        .await
        .map_err(Error::collaborator(Stage::ScimCreateGroups))?
    };
    let updated = if ops.update.is_empty() {
      GroupsResult::default()
    } else {
      self
        .scim
        .update_groups(&ops.update)
        .await
        .map_err(Error::collaborator(Stage::ScimUpdateGroups))?
    };
    if !ops.delete.is_empty() {
      self
        .scim
        .delete_groups(&ops.delete)
        .await
        .map_err(Error::collaborator(Stage::ScimDeleteGroups))?;
    }

    let counts = ChangeCounts {
      created:   ops.create.items(),
      updated:   ops.update.items(),
      deleted:   ops.delete.items(),
      unchanged: ops.equal.items(),
      skipped:   false,
    };
    Ok((merge_groups_result(&[&created, &updated, &ops.equal]), counts))
  }

  async fn reconcile_users(
    &self,
    idp: &UsersResult,
    comparison: &UsersResult,
  ) -> Result<(UsersResult, ChangeCounts)> {
    let ops = users_operations(Some(idp), Some(comparison))?;
    info!(
      create = ops.create.items(),
      update = ops.update.items(),
      equal = ops.equal.items(),
      delete = ops.delete.items(),
      "reconciling users"
    );

    let created = if ops.create.is_empty() {
      UsersResult::default()
    } else {
      self
        .scim
        .create_users(&ops.create)
        .await
        .map_err(Error::collaborator(Stage::ScimCreateUsers))?
    };
    let updated = if ops.update.is_empty() {
      UsersResult::default()
    } else {
      self
        .scim
        .update_users(&ops.update)
        .await
        .map_err(Error::collaborator(Stage::ScimUpdateUsers))?
    };
    if !ops.delete.is_empty() {
      self
        .scim
        .delete_users(&ops.delete)
        .await
        .map_err(Error::collaborator(Stage::ScimDeleteUsers))?;
    }

    let counts = ChangeCounts {
      created:   ops.create.items(),
      updated:   ops.update.items(),
      deleted:   ops.delete.items(),
      unchanged: ops.equal.items(),
      skipped:   false,
    };
    Ok((merge_users_result(&[&created, &updated, &ops.equal]), counts))
  }

  /// Reconcile memberships once groups and users carry their SCIM ids.
  ///
  /// Removals for groups that no longer exist in `groups` are not sent:
  /// those groups were deleted in this run along with their membership.
  async fn reconcile_members(
    &self,
    idp: &GroupsMembersResult,
    groups: &GroupsResult,
    users: &UsersResult,
    comparison: &GroupsMembersResult,
  ) -> Result<(GroupsMembersResult, ChangeCounts)> {
    let idp = update_groups_members_scimid(idp, groups, users);
    let ops = members_operations(Some(&idp), Some(comparison))?;

    let live: HashSet<&str> = groups.iter().map(|g| g.name.as_str()).collect();
    let delete: GroupsMembersResult = ops
      .delete
      .iter()
      .filter(|gm| live.contains(gm.group().name.as_str()))
      .cloned()
      .collect();

    info!(
      create = member_count(&ops.create),
      equal = member_count(&ops.equal),
      delete = member_count(&delete),
      "reconciling groups members"
    );

    let created = if ops.create.is_empty() {
      GroupsMembersResult::default()
    } else {
      self
        .scim
        .create_groups_members(&ops.create)
        .await
        .map_err(Error::collaborator(Stage::ScimCreateGroupsMembers))?
    };
    if !delete.is_empty() {
      self
        .scim
        .delete_groups_members(&delete)
        .await
        .map_err(Error::collaborator(Stage::ScimDeleteGroupsMembers))?;
    }

    let counts = ChangeCounts {
      created:   member_count(&ops.create),
      updated:   0,
      deleted:   member_count(&delete),
      unchanged: member_count(&ops.equal),
      skipped:   false,
    };
    // A group that gained members sits in both partitions.
    let totals = merge_groups_members_result(&[&created, &ops.equal]);
    Ok((fold_groups_members(&totals), counts))
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Members across every group in `set`.
fn member_count(set: &GroupsMembersResult) -> usize {
  set.iter().map(GroupMembers::items).sum()
}

/// Keep the first group for each name, warning about the rest.
fn dedup_groups_by_name(groups: GroupsResult) -> GroupsResult {
  if groups.items() < 2 {
    return groups;
  }

  let mut seen: HashSet<String> = HashSet::with_capacity(groups.items());
  let mut unique: Vec<Group> = Vec::with_capacity(groups.items());
  let mut dropped = 0usize;

  for group in groups.into_resources() {
    if seen.insert(group.name.clone()) {
      unique.push(group);
    } else {
      warn!(name = %group.name, ipid = %group.ipid, "duplicate group name from identity provider, keeping the first");
      dropped += 1;
    }
  }

  if dropped > 0 {
    warn!(dropped, "deduplicated identity provider groups by name");
  }
  unique.into()
}

/// Drop members whose email does not belong to any user in `users`.
fn retain_known_members(
  groups_members: &GroupsMembersResult,
  users: &UsersResult,
) -> GroupsMembersResult {
  let emails: HashSet<&str> = users.iter().map(|u| u.primary_email()).collect();

  groups_members
    .iter()
    .map(|gm| {
      let (kept, dropped): (Vec<Member>, Vec<Member>) = gm
        .resources()
        .iter()
        .cloned()
        .partition(|m| emails.contains(m.email.as_str()));
      for member in &dropped {
        warn!(
          group = %gm.group().name,
          email = %member.email,
          "member is not among the synced users, skipping"
        );
      }
      GroupMembers::builder()
        .with_group(gm.group().clone())
        .with_resources(kept)
        .build()
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dedup_keeps_first_occurrence() {
    let groups = GroupsResult::from(vec![
      Group::builder().with_ipid("1").with_name("dup").build(),
      Group::builder().with_ipid("2").with_name("other").build(),
      Group::builder().with_ipid("3").with_name("dup").build(),
    ]);
    let unique = dedup_groups_by_name(groups);
    let ipids: Vec<&str> = unique.iter().map(|g| g.ipid.as_str()).collect();
    assert_eq!(ipids, ["1", "2"]);
    assert_eq!(unique.items(), 2);
  }

  #[test]
  fn retain_known_members_filters_by_user_email() {
    use crate::model::{Email, User};

    let users = UsersResult::from(vec![
      User::builder()
        .with_user_name("a@mail.com")
        .with_emails(vec![Email::new("a@mail.com", "work", true)])
        .build(),
    ]);
    let gm = GroupsMembersResult::from(vec![
      GroupMembers::builder()
        .with_group(Group::builder().with_name("g").build())
        .with_resources(vec![
          Member::builder().with_email("a@mail.com").build(),
          Member::builder().with_email("b@mail.com").build(),
        ])
        .build(),
    ]);

    let kept = retain_known_members(&gm, &users);
    assert_eq!(kept.resources()[0].items(), 1);
    assert_eq!(kept.resources()[0].resources()[0].email, "a@mail.com");
  }
}
