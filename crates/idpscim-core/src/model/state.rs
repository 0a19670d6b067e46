//! State: the durable snapshot written after every successful sync.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hash::{self, Canonical, Encoder};

use super::{GroupsMembersResult, GroupsResult, UsersResult};

/// Version of the persisted state layout.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// The three result sets tracked between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StateResources {
  pub groups:         GroupsResult,
  pub users:          UsersResult,
  pub groups_members: GroupsMembersResult,
}

impl StateResources {
  /// A rebuilt copy with every SCIM id removed.
  pub fn without_scimids(&self) -> Self {
    Self {
      groups:         self.groups.without_scimids(),
      users:          self.users.without_scimids(),
      groups_members: self.groups_members.without_scimids(),
    }
  }
}

impl Canonical for StateResources {
  fn encode(&self, enc: &mut Encoder) {
    enc
      .tag("state_resources")
      .value(&self.groups)
      .value(&self.users)
      .value(&self.groups_members);
  }
}

/// Snapshot of what the identity provider asserted at the last sync,
/// annotated with the SCIM ids the target assigned.
///
/// `hash_code` covers the resources only, with every SCIM id stripped.
/// Metadata (`last_sync`, `code_version`) never participates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
  pub schema_version: String,
  #[serde(default)]
  pub code_version:   String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub last_sync:      Option<DateTime<Utc>>,
  #[serde(default)]
  pub hash_code:      String,
  #[serde(default)]
  pub resources:      StateResources,
}

impl Default for State {
  fn default() -> Self {
    Self {
      schema_version: SCHEMA_VERSION.to_owned(),
      code_version:   String::new(),
      last_sync:      None,
      hash_code:      String::new(),
      resources:      StateResources::default(),
    }
  }
}

impl State {
  pub fn builder() -> StateBuilder { StateBuilder::default() }

  /// Recompute `hash_code` from a SCIM-id-free copy of the resources.
  pub fn set_hash_code(&mut self) {
    self.hash_code = hash::hash(&self.resources.without_scimids());
  }

  /// `false` for a state that has never been produced by a sync.
  pub fn is_initialized(&self) -> bool { !self.hash_code.is_empty() }
}

#[derive(Debug, Default)]
pub struct StateBuilder {
  state: State,
}

impl StateBuilder {
  pub fn with_code_version(mut self, version: impl Into<String>) -> Self {
    self.state.code_version = version.into();
    self
  }

  pub fn with_last_sync(mut self, at: DateTime<Utc>) -> Self {
    self.state.last_sync = Some(at);
    self
  }

  pub fn with_groups(mut self, groups: GroupsResult) -> Self {
    self.state.resources.groups = groups;
    self
  }

  pub fn with_users(mut self, users: UsersResult) -> Self {
    self.state.resources.users = users;
    self
  }

  pub fn with_groups_members(mut self, groups_members: GroupsMembersResult) -> Self {
    self.state.resources.groups_members = groups_members;
    self
  }

  pub fn build(mut self) -> State {
    self.state.schema_version = SCHEMA_VERSION.to_owned();
    self.state.set_hash_code();
    self.state
  }
}
