//! Identity provider backed by a JSON export of the directory.
//!
//! The export holds the groups, the users, and each group's members keyed
//! by group id. It is read once at start-up; every query is answered from
//! memory.

use std::{
  collections::{HashMap, HashSet},
  path::{Path, PathBuf},
};

use idpscim_core::{
  model::{
    Address, Email, EnterpriseData, Group, GroupsMembersResult, GroupsResult,
    Member, MembersResult, Name, PhoneNumber, User, UsersResult,
  },
  service::IdentityProviderService,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum DirectoryError {
  #[error("failed to read directory export {path}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid directory export: {0}")]
  Json(#[from] serde_json::Error),
}

// ─── Export format ───────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Export {
  groups:  Vec<ExportGroup>,
  users:   Vec<ExportUser>,
  /// Group id → members.
  members: HashMap<String, Vec<ExportMember>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ExportGroup {
  id:    String,
  name:  String,
  email: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ExportUser {
  id:                 String,
  /// The principal address the user signs in with.
  primary_email:      String,
  display_name:       String,
  nick_name:          String,
  profile_url:        String,
  title:              String,
  user_type:          String,
  preferred_language: String,
  locale:             String,
  timezone:           String,
  suspended:          bool,
  name:               Option<Name>,
  emails:             Vec<Email>,
  addresses:          Vec<Address>,
  phone_numbers:      Vec<PhoneNumber>,
  enterprise:         Option<EnterpriseData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportMember {
  #[serde(default)]
  id:     String,
  #[serde(default)]
  email:  String,
  #[serde(rename = "type", default = "user_kind")]
  kind:   String,
  #[serde(default)]
  status: String,
}

fn user_kind() -> String { "USER".to_owned() }

// ─── Provider ────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct DirectoryProvider {
  groups:     Vec<Group>,
  users:      Vec<User>,
  /// User ipid → index into `users`.
  user_index: HashMap<String, usize>,
  members:    HashMap<String, Vec<ExportMember>>,
}

impl DirectoryProvider {
  pub async fn load(path: &Path) -> Result<Self, DirectoryError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| DirectoryError::Io {
      path: path.to_path_buf(),
      source,
    })?;
    let provider = Self::from_json(&bytes)?;
    debug!(
      path = %path.display(),
      groups = provider.groups.len(),
      users = provider.users.len(),
      "loaded directory export"
    );
    Ok(provider)
  }

  pub fn from_json(bytes: &[u8]) -> Result<Self, DirectoryError> {
    let export: Export = serde_json::from_slice(bytes)?;
    Ok(Self::from_export(export))
  }

  fn from_export(export: Export) -> Self {
    let groups = export
      .groups
      .into_iter()
      .map(|g| {
        Group::builder()
          .with_ipid(g.id)
          .with_name(g.name)
          .with_email(g.email)
          .build()
      })
      .collect();
    let users: Vec<User> = export.users.into_iter().map(into_user).collect();

    let mut user_index = HashMap::with_capacity(users.len());
    for (i, user) in users.iter().enumerate() {
      user_index.entry(user.ipid.clone()).or_insert(i);
    }

    Self {
      groups,
      users,
      user_index,
      members: export.members,
    }
  }

  fn user_by_id(&self, id: &str) -> Option<&User> {
    self.user_index.get(id).and_then(|&i| self.users.get(i))
  }
}

fn into_user(u: ExportUser) -> User {
  let mut emails = u.emails;
  if !emails.iter().any(|e| e.primary) {
    warn!(
      user = %u.primary_email,
      "user has no primary email, using the principal address"
    );
    match emails.iter_mut().find(|e| e.value == u.primary_email) {
      Some(existing) => existing.primary = true,
      None => emails.push(Email::new(&u.primary_email, "work", true)),
    }
  }

  let mut builder = User::builder()
    .with_ipid(u.id)
    .with_user_name(u.primary_email)
    .with_display_name(u.display_name)
    .with_nick_name(u.nick_name)
    .with_profile_url(u.profile_url)
    .with_title(u.title)
    .with_user_type(u.user_type)
    .with_preferred_language(u.preferred_language)
    .with_locale(u.locale)
    .with_timezone(u.timezone)
    .with_active(!u.suspended)
    .with_emails(emails)
    .with_addresses(u.addresses)
    .with_phone_numbers(u.phone_numbers);
  if let Some(name) = u.name {
    builder = builder.with_name(name);
  }
  if let Some(enterprise) = u.enterprise {
    builder = builder.with_enterprise_data(enterprise);
  }
  builder.build()
}

/// `pattern` matches `value` exactly, or as a prefix when it ends in `*`.
fn pattern_matches(pattern: &str, value: &str) -> bool {
  match pattern.strip_suffix('*') {
    Some(prefix) => value.starts_with(prefix),
    None => pattern == value,
  }
}

fn selected(filter: &[String], value: &str) -> bool {
  filter.is_empty() || filter.iter().any(|p| pattern_matches(p, value))
}

impl IdentityProviderService for DirectoryProvider {
  type Error = DirectoryError;

  async fn get_groups(&self, filter: &[String]) -> Result<GroupsResult, DirectoryError> {
    Ok(
      self
        .groups
        .iter()
        .filter(|g| selected(filter, &g.name))
        .cloned()
        .collect(),
    )
  }

  async fn get_users(&self, filter: &[String]) -> Result<UsersResult, DirectoryError> {
    Ok(
      self
        .users
        .iter()
        .filter(|u| selected(filter, u.primary_email()))
        .cloned()
        .collect(),
    )
  }

  async fn get_group_members(&self, group_id: &str) -> Result<MembersResult, DirectoryError> {
    let Some(entries) = self.members.get(group_id) else {
      return Ok(MembersResult::default());
    };

    let mut members: Vec<Member> = Vec::with_capacity(entries.len());
    for entry in entries {
      if entry.kind != "USER" {
        debug!(group = group_id, member = %entry.id, kind = %entry.kind, "skipping non-user member");
        continue;
      }
      let email = if entry.email.is_empty() {
        self
          .user_by_id(&entry.id)
          .map(|u| u.primary_email().to_owned())
          .unwrap_or_default()
      } else {
        entry.email.clone()
      };
      if email.is_empty() {
        warn!(group = group_id, member = %entry.id, "member has no email, skipping");
        continue;
      }
      members.push(
        Member::builder()
          .with_ipid(&entry.id)
          .with_email(email)
          .with_status(&entry.status)
          .build(),
      );
    }
    Ok(members.into())
  }

  async fn get_users_by_groups_members(
    &self,
    groups_members: &GroupsMembersResult,
  ) -> Result<UsersResult, DirectoryError> {
    let wanted: HashSet<&str> = groups_members
      .iter()
      .flat_map(|gm| gm.resources().iter().map(|m| m.email.as_str()))
      .collect();
    Ok(
      self
        .users
        .iter()
        .filter(|u| wanted.contains(u.primary_email()))
        .cloned()
        .collect(),
    )
  }
}

#[cfg(test)]
mod tests {
  use idpscim_core::model::GroupMembers;

  use super::*;

  const EXPORT: &str = r#"{
    "groups": [
      { "id": "g1", "name": "eng-backend", "email": "backend@mail.com" },
      { "id": "g2", "name": "eng-frontend" },
      { "id": "g3", "name": "sales" }
    ],
    "users": [
      {
        "id": "u1",
        "primaryEmail": "a@mail.com",
        "displayName": "User A",
        "name": { "givenName": "User", "familyName": "A" },
        "emails": [{ "value": "a@mail.com", "type": "work", "primary": true }]
      },
      {
        "id": "u2",
        "primaryEmail": "b@mail.com",
        "suspended": true,
        "emails": [{ "value": "b.alias@mail.com", "type": "home" }]
      },
      { "id": "u3", "primaryEmail": "c@mail.com" }
    ],
    "members": {
      "g1": [
        { "id": "u1", "email": "a@mail.com", "type": "USER", "status": "ACTIVE" },
        { "id": "g3", "email": "sales@mail.com", "type": "GROUP" },
        { "id": "u3" }
      ],
      "g2": [{ "id": "u2", "email": "b@mail.com" }]
    }
  }"#;

  fn provider() -> DirectoryProvider { DirectoryProvider::from_json(EXPORT.as_bytes()).unwrap() }

  fn names(groups: &GroupsResult) -> Vec<&str> {
    groups.iter().map(|g| g.name.as_str()).collect()
  }

  #[test]
  fn trailing_star_is_a_prefix_match() {
    assert!(pattern_matches("eng*", "eng-backend"));
    assert!(pattern_matches("*", "anything"));
    assert!(pattern_matches("sales", "sales"));
    assert!(!pattern_matches("sales", "sales-emea"));
    assert!(!pattern_matches("eng*", "sales"));
  }

  #[tokio::test]
  async fn groups_are_filtered_by_name() {
    let p = provider();

    let all = p.get_groups(&[]).await.unwrap();
    assert_eq!(names(&all), ["eng-backend", "eng-frontend", "sales"]);

    let eng = p.get_groups(&["eng*".to_owned()]).await.unwrap();
    assert_eq!(names(&eng), ["eng-backend", "eng-frontend"]);

    let exact = p.get_groups(&["sales".to_owned(), "nope".to_owned()]).await.unwrap();
    assert_eq!(names(&exact), ["sales"]);
  }

  #[tokio::test]
  async fn users_without_primary_email_get_the_principal_address() {
    let p = provider();
    let users = p.get_users(&[]).await.unwrap();

    let b = users.iter().find(|u| u.ipid == "u2").unwrap();
    assert_eq!(b.primary_email(), "b@mail.com");
    assert_eq!(b.emails.len(), 2);
    assert!(!b.active);

    let c = users.iter().find(|u| u.ipid == "u3").unwrap();
    assert_eq!(c.primary_email(), "c@mail.com");
    assert!(c.active);

    let filtered = p.get_users(&["a@*".to_owned()]).await.unwrap();
    assert_eq!(filtered.items(), 1);
  }

  #[tokio::test]
  async fn only_user_members_are_kept() {
    let p = provider();
    let members = p.get_group_members("g1").await.unwrap();

    let emails: Vec<&str> = members.iter().map(|m| m.email.as_str()).collect();
    // u3 has no email in the export and is resolved through the user list.
    assert_eq!(emails, ["a@mail.com", "c@mail.com"]);
    assert_eq!(members.resources()[0].status, "ACTIVE");

    assert!(p.get_group_members("unknown").await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn users_by_groups_members_follows_membership() {
    let p = provider();
    let group = p.get_groups(&["eng-backend".to_owned()]).await.unwrap();
    let members = p.get_group_members("g1").await.unwrap();
    let gm = GroupsMembersResult::from(vec![
      GroupMembers::builder()
        .with_group(group.resources()[0].clone())
        .with_resources(members.into_resources())
        .build(),
    ]);

    let users = p.get_users_by_groups_members(&gm).await.unwrap();
    let ids: Vec<&str> = users.iter().map(|u| u.ipid.as_str()).collect();
    assert_eq!(ids, ["u1", "u3"]);
  }

  #[tokio::test]
  async fn member_email_resolves_to_the_first_user_with_that_id() {
    let p = DirectoryProvider::from_json(
      br#"{
        "users": [
          { "id": "u1", "primaryEmail": "first@mail.com" },
          { "id": "u1", "primaryEmail": "second@mail.com" },
          { "id": "u2", "primaryEmail": "other@mail.com" }
        ],
        "members": { "g1": [{ "id": "u1" }, { "id": "u2" }, { "id": "gone" }] }
      }"#,
    )
    .unwrap();

    let members = p.get_group_members("g1").await.unwrap();
    let emails: Vec<&str> = members.iter().map(|m| m.email.as_str()).collect();
    assert_eq!(emails, ["first@mail.com", "other@mail.com"]);
  }

  #[tokio::test]
  async fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = DirectoryProvider::load(&dir.path().join("missing.json"))
      .await
      .unwrap_err();
    assert!(matches!(err, DirectoryError::Io { .. }));
  }
}
