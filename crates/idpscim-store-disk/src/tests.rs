//! Tests for `DiskStateRepository` against a temporary directory.

use chrono::{TimeZone as _, Utc};
use idpscim_core::{
  model::{
    Email, Group, GroupMembers, GroupsMembersResult, GroupsResult, Member,
    State, User, UsersResult,
  },
  service::StateRepository,
};
use tempfile::TempDir;

use crate::{DiskStateRepository, Error};

fn state() -> State {
  let group = Group::builder()
    .with_ipid("g1")
    .with_scimid("sg1")
    .with_name("group 1")
    .with_email("group.1@mail.com")
    .build();
  let user = User::builder()
    .with_ipid("u1")
    .with_scimid("su1")
    .with_user_name("a@mail.com")
    .with_display_name("user a")
    .with_active(true)
    .with_emails(vec![Email::new("a@mail.com", "work", true)])
    .build();
  let member = Member::builder()
    .with_ipid("u1")
    .with_scimid("su1")
    .with_email("a@mail.com")
    .with_status("ACTIVE")
    .build();

  State::builder()
    .with_code_version("0.1.0")
    .with_last_sync(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
    .with_groups(GroupsResult::from(vec![group.clone()]))
    .with_users(UsersResult::from(vec![user]))
    .with_groups_members(GroupsMembersResult::from(vec![
      GroupMembers::builder()
        .with_group(group)
        .with_resource(member)
        .build(),
    ]))
    .build()
}

#[tokio::test]
async fn missing_file_is_no_state() {
  let dir = TempDir::new().unwrap();
  let repo = DiskStateRepository::new(dir.path().join("state.json"));

  assert!(repo.get_state().await.unwrap().is_none());
}

#[tokio::test]
async fn store_then_get_returns_the_same_state() {
  let dir = TempDir::new().unwrap();
  let path = dir.path().join("state.json");
  let repo = DiskStateRepository::new(&path);
  let state = state();

  let stored = repo.store_state(&state).await.unwrap();
  assert_eq!(stored.location, path.display().to_string());

  let loaded = repo.get_state().await.unwrap().unwrap();
  assert_eq!(loaded, state);
  assert!(loaded.is_initialized());
}

#[tokio::test]
async fn store_creates_parent_directories() {
  let dir = TempDir::new().unwrap();
  let path = dir.path().join("nested").join("deeper").join("state.json");
  let repo = DiskStateRepository::new(&path);

  repo.store_state(&state()).await.unwrap();
  assert!(path.is_file());
}

#[tokio::test]
async fn store_replaces_previous_state_and_leaves_no_temp_file() {
  let dir = TempDir::new().unwrap();
  let repo = DiskStateRepository::new(dir.path().join("state.json"));

  repo.store_state(&state()).await.unwrap();
  let empty = State::builder().with_code_version("0.2.0").build();
  repo.store_state(&empty).await.unwrap();

  let loaded = repo.get_state().await.unwrap().unwrap();
  assert_eq!(loaded.code_version, "0.2.0");
  assert!(loaded.resources.groups.is_empty());

  let names: Vec<String> = std::fs::read_dir(dir.path())
    .unwrap()
    .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
    .collect();
  assert_eq!(names, ["state.json"]);
}

#[tokio::test]
async fn written_document_uses_camel_case_and_empty_arrays() {
  let dir = TempDir::new().unwrap();
  let path = dir.path().join("state.json");
  let repo = DiskStateRepository::new(&path);

  repo.store_state(&State::builder().build()).await.unwrap();

  let raw: serde_json::Value =
    serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
  assert_eq!(raw["schemaVersion"], "1.0.0");
  assert_eq!(raw["resources"]["groups"]["resources"], serde_json::json!([]));
  assert_eq!(
    raw["resources"]["groupsMembers"]["resources"],
    serde_json::json!([])
  );
}

#[tokio::test]
async fn null_resource_arrays_read_back_as_empty() {
  let dir = TempDir::new().unwrap();
  let path = dir.path().join("state.json");
  std::fs::write(
    &path,
    r#"{
      "schemaVersion": "1.0.0",
      "codeVersion": "0.0.1",
      "hashCode": "abc",
      "resources": {
        "groups": { "items": 0, "hashCode": "", "resources": null },
        "users": { "items": 0, "hashCode": "", "resources": null },
        "groupsMembers": { "items": 0, "hashCode": "", "resources": null }
      }
    }"#,
  )
  .unwrap();

  let loaded = DiskStateRepository::new(&path)
    .get_state()
    .await
    .unwrap()
    .unwrap();
  assert!(loaded.resources.groups.is_empty());
  assert!(loaded.resources.users.is_empty());
  assert!(loaded.resources.groups_members.is_empty());
  assert!(loaded.last_sync.is_none());
}

#[tokio::test]
async fn corrupt_file_is_an_error() {
  let dir = TempDir::new().unwrap();
  let path = dir.path().join("state.json");
  std::fs::write(&path, b"{ not json").unwrap();

  let err = DiskStateRepository::new(&path).get_state().await.unwrap_err();
  assert!(matches!(err, Error::Json { .. }));
  assert!(err.to_string().contains("state.json"));
}
