//! `ScimClient` against an in-process axum SCIM server.

use std::sync::{Arc, Mutex};

use axum::{
  Json, Router,
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode, header::AUTHORIZATION},
  routing::get,
};
use idpscim_core::{
  model::{
    Email, Group, GroupMembers, GroupsMembersResult, GroupsResult, Member,
    Name, User, UsersResult,
  },
  service::ScimService,
};
use serde::Deserialize;
use serde_json::Value;
use tokio::net::TcpListener;
use uuid::Uuid;

use crate::{
  ScimClient, ScimConfig, ScimError,
  model::{LIST_RESPONSE_SCHEMA, ListResponse, MemberRef, PatchRequest, ScimGroup, ScimUser},
};

const TOKEN: &str = "test-token";

// ─── Mock server ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct Directory {
  users:    Vec<ScimUser>,
  groups:   Vec<ScimGroup>,
  requests: Vec<&'static str>,
}

type Shared = Arc<Mutex<Directory>>;
type Reply<T> = Result<T, (StatusCode, &'static str)>;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page {
  start_index: Option<usize>,
  count:       Option<usize>,
}

fn authorise(headers: &HeaderMap) -> Reply<()> {
  let expected = format!("Bearer {TOKEN}");
  match headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
    Some(v) if v == expected => Ok(()),
    _ => Err((StatusCode::UNAUTHORIZED, "bad token")),
  }
}

fn page_of<T: Clone>(items: &[T], page: &Page) -> ListResponse<T> {
  let start = page.start_index.unwrap_or(1).max(1);
  let count = page.count.unwrap_or(items.len());
  let resources: Vec<T> = items.iter().skip(start - 1).take(count).cloned().collect();
  ListResponse {
    schemas: vec![LIST_RESPONSE_SCHEMA.to_owned()],
    total_results: items.len(),
    start_index: start,
    items_per_page: resources.len(),
    resources,
  }
}

fn member_ids(value: Option<&Value>) -> Vec<String> {
  value
    .and_then(Value::as_array)
    .map(|refs| {
      refs
        .iter()
        .filter_map(|r| r["value"].as_str().map(str::to_owned))
        .collect()
    })
    .unwrap_or_default()
}

async fn list_users(
  State(dir): State<Shared>,
  headers: HeaderMap,
  Query(page): Query<Page>,
) -> Reply<Json<ListResponse<ScimUser>>> {
  authorise(&headers)?;
  let mut dir = dir.lock().unwrap();
  dir.requests.push("GET /Users");
  Ok(Json(page_of(&dir.users, &page)))
}

async fn create_user(
  State(dir): State<Shared>,
  headers: HeaderMap,
  Json(mut user): Json<ScimUser>,
) -> Reply<(StatusCode, Json<ScimUser>)> {
  authorise(&headers)?;
  let mut dir = dir.lock().unwrap();
  dir.requests.push("POST /Users");
  user.id = Uuid::new_v4().to_string();
  dir.users.push(user.clone());
  Ok((StatusCode::CREATED, Json(user)))
}

async fn replace_user(
  State(dir): State<Shared>,
  headers: HeaderMap,
  Path(id): Path<String>,
  Json(mut user): Json<ScimUser>,
) -> Reply<Json<ScimUser>> {
  authorise(&headers)?;
  let mut dir = dir.lock().unwrap();
  dir.requests.push("PUT /Users");
  let slot = dir
    .users
    .iter_mut()
    .find(|u| u.id == id)
    .ok_or((StatusCode::NOT_FOUND, "no such user"))?;
  user.id = id;
  *slot = user.clone();
  Ok(Json(user))
}

async fn delete_user(
  State(dir): State<Shared>,
  headers: HeaderMap,
  Path(id): Path<String>,
) -> Reply<StatusCode> {
  authorise(&headers)?;
  let mut dir = dir.lock().unwrap();
  dir.requests.push("DELETE /Users");
  let before = dir.users.len();
  dir.users.retain(|u| u.id != id);
  if dir.users.len() == before {
    return Err((StatusCode::NOT_FOUND, "no such user"));
  }
  for group in &mut dir.groups {
    group.members.retain(|m| m.value != id);
  }
  Ok(StatusCode::NO_CONTENT)
}

async fn list_groups(
  State(dir): State<Shared>,
  headers: HeaderMap,
  Query(page): Query<Page>,
) -> Reply<Json<ListResponse<ScimGroup>>> {
  authorise(&headers)?;
  let mut dir = dir.lock().unwrap();
  dir.requests.push("GET /Groups");
  Ok(Json(page_of(&dir.groups, &page)))
}

async fn create_group(
  State(dir): State<Shared>,
  headers: HeaderMap,
  Json(mut group): Json<ScimGroup>,
) -> Reply<(StatusCode, Json<ScimGroup>)> {
  authorise(&headers)?;
  let mut dir = dir.lock().unwrap();
  dir.requests.push("POST /Groups");
  group.id = Uuid::new_v4().to_string();
  dir.groups.push(group.clone());
  Ok((StatusCode::CREATED, Json(group)))
}

async fn get_group(
  State(dir): State<Shared>,
  headers: HeaderMap,
  Path(id): Path<String>,
) -> Reply<Json<ScimGroup>> {
  authorise(&headers)?;
  let mut dir = dir.lock().unwrap();
  dir.requests.push("GET /Groups/{id}");
  dir
    .groups
    .iter()
    .find(|g| g.id == id)
    .cloned()
    .map(Json)
    .ok_or((StatusCode::NOT_FOUND, "no such group"))
}

async fn patch_group(
  State(dir): State<Shared>,
  headers: HeaderMap,
  Path(id): Path<String>,
  Json(patch): Json<PatchRequest>,
) -> Reply<StatusCode> {
  authorise(&headers)?;
  let mut dir = dir.lock().unwrap();
  dir.requests.push("PATCH /Groups");
  let group = dir
    .groups
    .iter_mut()
    .find(|g| g.id == id)
    .ok_or((StatusCode::NOT_FOUND, "no such group"))?;

  for op in patch.operations {
    let text = op.value.as_ref().and_then(Value::as_str).unwrap_or_default();
    match (op.op.as_str(), op.path.as_deref()) {
      ("replace", Some("externalId")) => group.external_id = text.to_owned(),
      ("replace", Some("displayName")) => group.display_name = text.to_owned(),
      ("add", Some("members")) => {
        for id in member_ids(op.value.as_ref()) {
          if !group.members.iter().any(|m| m.value == id) {
            group.members.push(MemberRef {
              value:   id,
              display: String::new(),
            });
          }
        }
      }
      ("remove", Some("members")) => {
        let ids = member_ids(op.value.as_ref());
        group.members.retain(|m| !ids.contains(&m.value));
      }
      _ => return Err((StatusCode::BAD_REQUEST, "unsupported patch operation")),
    }
  }
  Ok(StatusCode::NO_CONTENT)
}

async fn delete_group(
  State(dir): State<Shared>,
  headers: HeaderMap,
  Path(id): Path<String>,
) -> Reply<StatusCode> {
  authorise(&headers)?;
  let mut dir = dir.lock().unwrap();
  dir.requests.push("DELETE /Groups");
  let before = dir.groups.len();
  dir.groups.retain(|g| g.id != id);
  if dir.groups.len() == before {
    return Err((StatusCode::NOT_FOUND, "no such group"));
  }
  Ok(StatusCode::NO_CONTENT)
}

/// Serve the mock under `/scim/v2` on an ephemeral port.
async fn serve(token: &str) -> (ScimClient, Shared) {
  let dir = Shared::default();
  let api = Router::new()
    .route("/Users", get(list_users).post(create_user))
    .route(
      "/Users/{id}",
      axum::routing::put(replace_user).delete(delete_user),
    )
    .route("/Groups", get(list_groups).post(create_group))
    .route(
      "/Groups/{id}",
      get(get_group).patch(patch_group).delete(delete_group),
    )
    .with_state(dir.clone());
  let app = Router::new().nest("/scim/v2", api);

  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

  let client = ScimClient::new(&ScimConfig {
    endpoint: format!("http://{addr}/scim/v2/"),
    access_token: token.to_owned(),
    page_size: 2,
    ..ScimConfig::default()
  })
  .unwrap();
  (client, dir)
}

fn requests(dir: &Shared, kind: &str) -> usize {
  dir.lock().unwrap().requests.iter().filter(|r| **r == kind).count()
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

fn user(n: usize) -> User {
  let email = format!("user.{n}@mail.com");
  User::builder()
    .with_ipid(format!("u{n}"))
    .with_user_name(&email)
    .with_display_name(format!("User {n}"))
    .with_active(true)
    .with_name(Name {
      given_name: "User".into(),
      family_name: n.to_string(),
      ..Name::default()
    })
    .with_emails(vec![Email::new(&email, "work", true)])
    .build()
}

fn group(n: usize) -> Group {
  Group::builder()
    .with_ipid(format!("g{n}"))
    .with_name(format!("group {n}"))
    .build()
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn created_users_come_back_through_paginated_listing() {
  let (client, dir) = serve(TOKEN).await;
  let users = UsersResult::from((1..=5).map(user).collect::<Vec<_>>());

  let created = client.create_users(&users).await.unwrap();
  assert_eq!(created.items(), 5);
  assert!(created.iter().all(|u| !u.scimid.is_empty()));
  assert_eq!(created.hash_code(), users.hash_code());

  let listed = ScimService::get_users(&client).await.unwrap();
  assert_eq!(listed.items(), 5);
  assert_eq!(listed.hash_code(), users.hash_code());
  let ids: Vec<&str> = listed.iter().map(|u| u.scimid.as_str()).collect();
  let expected: Vec<&str> = created.iter().map(|u| u.scimid.as_str()).collect();
  assert_eq!(ids, expected);

  // 2 + 2 + 1
  assert_eq!(requests(&dir, "GET /Users"), 3);
}

#[tokio::test]
async fn empty_listing_takes_one_request() {
  let (client, dir) = serve(TOKEN).await;

  let groups = ScimService::get_groups(&client).await.unwrap();
  assert!(groups.is_empty());
  assert_eq!(requests(&dir, "GET /Groups"), 1);
}

#[tokio::test]
async fn group_update_patches_external_id_and_display_name() {
  let (client, dir) = serve(TOKEN).await;
  let created = client
    .create_groups(&GroupsResult::from(vec![group(1)]))
    .await
    .unwrap();
  let scimid = created.resources()[0].scimid.clone();

  let renamed = Group::builder()
    .with_ipid("g1-new")
    .with_scimid(&scimid)
    .with_name("group 1")
    .build();
  client
    .update_groups(&GroupsResult::from(vec![renamed]))
    .await
    .unwrap();

  let listed = ScimService::get_groups(&client).await.unwrap();
  let g = &listed.resources()[0];
  assert_eq!(g.scimid, scimid);
  assert_eq!(g.ipid, "g1-new");
  assert_eq!(g.name, "group 1");
  assert_eq!(requests(&dir, "PATCH /Groups"), 1);
}

#[tokio::test]
async fn membership_is_added_read_and_removed() {
  let (client, _dir) = serve(TOKEN).await;
  let users = client
    .create_users(&UsersResult::from(vec![user(1), user(2)]))
    .await
    .unwrap();
  let groups = client
    .create_groups(&GroupsResult::from(vec![group(1)]))
    .await
    .unwrap();

  let members: Vec<Member> = users
    .iter()
    .map(|u| {
      Member::builder()
        .with_ipid(&u.ipid)
        .with_scimid(&u.scimid)
        .with_email(u.primary_email())
        .build()
    })
    .collect();
  let gm = GroupsMembersResult::from(vec![
    GroupMembers::builder()
      .with_group(groups.resources()[0].clone())
      .with_resources(members.clone())
      .build(),
  ]);
  client.create_groups_members(&gm).await.unwrap();

  let read = client.get_groups_members(&groups, &users).await.unwrap();
  let emails: Vec<&str> = read.resources()[0]
    .resources()
    .iter()
    .map(|m| m.email.as_str())
    .collect();
  assert_eq!(emails, ["user.1@mail.com", "user.2@mail.com"]);

  let removal = GroupsMembersResult::from(vec![
    GroupMembers::builder()
      .with_group(groups.resources()[0].clone())
      .with_resource(members[0].clone())
      .build(),
  ]);
  client.delete_groups_members(&removal).await.unwrap();

  let read = client.get_groups_members(&groups, &users).await.unwrap();
  assert_eq!(read.resources()[0].items(), 1);
  assert_eq!(read.resources()[0].resources()[0].email, "user.2@mail.com");
}

#[tokio::test]
async fn deletes_remove_resources() {
  let (client, _dir) = serve(TOKEN).await;
  let users = client
    .create_users(&UsersResult::from(vec![user(1)]))
    .await
    .unwrap();
  let groups = client
    .create_groups(&GroupsResult::from(vec![group(1)]))
    .await
    .unwrap();

  client.delete_users(&users).await.unwrap();
  client.delete_groups(&groups).await.unwrap();

  assert!(ScimService::get_users(&client).await.unwrap().is_empty());
  assert!(ScimService::get_groups(&client).await.unwrap().is_empty());
}

#[tokio::test]
async fn user_update_replaces_the_whole_resource() {
  let (client, _dir) = serve(TOKEN).await;
  let created = client
    .create_users(&UsersResult::from(vec![user(1)]))
    .await
    .unwrap();

  let mut changed = created.resources()[0].clone();
  changed.display_name = "Renamed".into();
  changed.set_hash_code();
  client
    .update_users(&UsersResult::from(vec![changed.clone()]))
    .await
    .unwrap();

  let listed = ScimService::get_users(&client).await.unwrap();
  assert_eq!(listed.resources()[0].display_name, "Renamed");
  assert_eq!(listed.resources()[0].hash_code, changed.hash_code);
}

#[tokio::test]
async fn missing_scim_id_fails_before_any_request() {
  let (client, dir) = serve(TOKEN).await;

  let err = client
    .delete_users(&UsersResult::from(vec![user(1)]))
    .await
    .unwrap_err();
  assert!(matches!(err, ScimError::MissingScimId { kind: "user", .. }));

  let gm = GroupsMembersResult::from(vec![
    GroupMembers::builder()
      .with_group(group(1).with_scimid("sg1"))
      .with_resource(Member::builder().with_email("a@mail.com").build())
      .build(),
  ]);
  let err = client.create_groups_members(&gm).await.unwrap_err();
  assert!(matches!(err, ScimError::MissingScimId { kind: "member", .. }));

  assert!(dir.lock().unwrap().requests.is_empty());
}

#[tokio::test]
async fn error_status_carries_the_body() {
  let (client, _dir) = serve(TOKEN).await;

  let err = client
    .delete_groups(&GroupsResult::from(vec![group(1).with_scimid("nope")]))
    .await
    .unwrap_err();
  match err {
    ScimError::Status { status, body } => {
      assert_eq!(status, 404);
      assert_eq!(body, "no such group");
    }
    other => panic!("unexpected error: {other}"),
  }
}

#[tokio::test]
async fn wrong_token_is_rejected() {
  let (client, _dir) = serve("wrong").await;

  let err = ScimService::get_users(&client).await.unwrap_err();
  assert!(matches!(err, ScimError::Status { status: 401, .. }));
}
