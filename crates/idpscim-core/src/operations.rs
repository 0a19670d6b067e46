//! Set-difference between an authoritative (identity provider) result set
//! and a comparison set (live SCIM data or the last persisted state).
//!
//! Each function partitions the inputs into the operations needed to make
//! the comparison side match the provider side. Output order follows the
//! input iteration order; only hashing sorts.

use std::collections::HashMap;

use crate::{
  Error, Result,
  model::{
    Group, GroupMembers, GroupsMembersResult, GroupsResult, Member, User,
    UsersResult,
  },
};

// ─── Groups ──────────────────────────────────────────────────────────────────

/// Partition of groups produced by [`groups_operations`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupsOperations {
  pub create: GroupsResult,
  pub update: GroupsResult,
  pub equal:  GroupsResult,
  pub delete: GroupsResult,
}

/// Compare groups by `name`.
///
/// A provider group known on the comparison side takes its SCIM id from
/// there. It is an update only when `ipid` differs; other attribute changes
/// (e.g. email) do not trigger an update.
pub fn groups_operations(
  idp: Option<&GroupsResult>,
  comparison: Option<&GroupsResult>,
) -> Result<GroupsOperations> {
  let idp = idp.ok_or(Error::IdentityProviderGroupsNil)?;
  let comparison = comparison.ok_or(Error::ScimGroupsNil)?;

  let idp_by_name = index(idp.resources(), |g| g.name.as_str());
  let cmp_by_name = index(comparison.resources(), |g| g.name.as_str());

  let mut create: Vec<Group> = vec![];
  let mut update: Vec<Group> = vec![];
  let mut equal: Vec<Group> = vec![];

  for group in idp {
    match cmp_by_name.get(group.name.as_str()) {
      None => create.push(group.clone()),
      Some(existing) => {
        let group = group.with_scimid(&existing.scimid);
        if group.ipid != existing.ipid {
          update.push(group);
        } else {
          equal.push(group);
        }
      }
    }
  }

  let delete: Vec<Group> = comparison
    .iter()
    .filter(|g| !idp_by_name.contains_key(g.name.as_str()))
    .cloned()
    .collect();

  Ok(GroupsOperations {
    create: create.into(),
    update: update.into(),
    equal:  equal.into(),
    delete: delete.into(),
  })
}

// ─── Users ───────────────────────────────────────────────────────────────────

/// Partition of users produced by [`users_operations`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsersOperations {
  pub create: UsersResult,
  pub update: UsersResult,
  pub equal:  UsersResult,
  pub delete: UsersResult,
}

/// Compare users by primary email.
///
/// Unlike groups, any difference in the user's hash is an update.
pub fn users_operations(
  idp: Option<&UsersResult>,
  comparison: Option<&UsersResult>,
) -> Result<UsersOperations> {
  let idp = idp.ok_or(Error::IdentityProviderUsersNil)?;
  let comparison = comparison.ok_or(Error::ScimUsersNil)?;

  let idp_by_email = index(idp.resources(), User::primary_email);
  let cmp_by_email = index(comparison.resources(), User::primary_email);

  let mut create: Vec<User> = vec![];
  let mut update: Vec<User> = vec![];
  let mut equal: Vec<User> = vec![];

  for user in idp {
    match cmp_by_email.get(user.primary_email()) {
      None => create.push(user.clone()),
      Some(existing) => {
        let user = user.with_scimid(&existing.scimid);
        if user.hash_code != existing.hash_code {
          update.push(user);
        } else {
          equal.push(user);
        }
      }
    }
  }

  let delete: Vec<User> = comparison
    .iter()
    .filter(|u| !idp_by_email.contains_key(u.primary_email()))
    .cloned()
    .collect();

  Ok(UsersOperations {
    create: create.into(),
    update: update.into(),
    equal:  equal.into(),
    delete: delete.into(),
  })
}

// ─── Members ─────────────────────────────────────────────────────────────────

/// Partition of memberships produced by [`members_operations`].
///
/// Membership is binary, so there is no update bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembersOperations {
  pub create: GroupsMembersResult,
  pub equal:  GroupsMembersResult,
  pub delete: GroupsMembersResult,
}

/// Compare memberships by group name, then by member email.
pub fn members_operations(
  idp: Option<&GroupsMembersResult>,
  comparison: Option<&GroupsMembersResult>,
) -> Result<MembersOperations> {
  let idp = idp.ok_or(Error::IdentityProviderGroupsMembersNil)?;
  let comparison = comparison.ok_or(Error::ScimGroupsMembersNil)?;

  let (create, equal, delete) =
    members_data_sets(idp.resources(), comparison.resources());

  Ok(MembersOperations {
    create: create.into(),
    equal:  equal.into(),
    delete: delete.into(),
  })
}

type MemberIndex<'a> = HashMap<&'a str, HashMap<&'a str, &'a Member>>;

fn member_index(groups: &[GroupMembers]) -> (HashMap<&str, &Group>, MemberIndex<'_>) {
  let mut group_by_name: HashMap<&str, &Group> = HashMap::new();
  let mut members_by_group: MemberIndex<'_> = HashMap::new();

  for gm in groups {
    let name = gm.group().name.as_str();
    group_by_name.entry(name).or_insert(gm.group());
    let members = members_by_group.entry(name).or_default();
    for member in gm.resources() {
      members.entry(member.email.as_str()).or_insert(member);
    }
  }

  (group_by_name, members_by_group)
}

/// Per-group create / equal / delete buckets.
///
/// A group with no members on either side is reported once as equal with
/// an empty member list.
fn members_data_sets(
  idp: &[GroupMembers],
  comparison: &[GroupMembers],
) -> (Vec<GroupMembers>, Vec<GroupMembers>, Vec<GroupMembers>) {
  let (_, idp_members) = member_index(idp);
  let (cmp_groups, cmp_members) = member_index(comparison);

  let mut create: Vec<GroupMembers> = vec![];
  let mut equal: Vec<GroupMembers> = vec![];
  let mut delete: Vec<GroupMembers> = vec![];

  for gm in idp {
    let name = gm.group().name.as_str();

    let mut group = gm.group().clone();
    if group.scimid.is_empty()
      && let Some(known) = cmp_groups.get(name)
    {
      group = group.with_scimid(&known.scimid);
    }

    let known_members = cmp_members.get(name);
    let known_count = known_members.map_or(0, HashMap::len);

    if gm.resources().is_empty() && known_count == 0 {
      equal.push(GroupMembers::builder().with_group(group).build());
      continue;
    }

    let mut to_create: Vec<Member> = vec![];
    let mut to_keep: Vec<Member> = vec![];

    for member in gm.resources() {
      match known_members.and_then(|m| m.get(member.email.as_str())) {
        None => to_create.push(member.clone()),
        Some(existing) => to_keep.push(member.with_scimid(&existing.scimid)),
      }
    }

    if !to_create.is_empty() {
      create.push(
        GroupMembers::builder()
          .with_group(group.clone())
          .with_resources(to_create)
          .build(),
      );
    }
    if !to_keep.is_empty() {
      equal.push(
        GroupMembers::builder()
          .with_group(group)
          .with_resources(to_keep)
          .build(),
      );
    }
  }

  for gm in comparison {
    let wanted = idp_members.get(gm.group().name.as_str());
    let to_delete: Vec<Member> = gm
      .resources()
      .iter()
      .filter(|m| !wanted.is_some_and(|w| w.contains_key(m.email.as_str())))
      .cloned()
      .collect();

    if !to_delete.is_empty() {
      delete.push(
        GroupMembers::builder()
          .with_group(gm.group().clone())
          .with_resources(to_delete)
          .build(),
      );
    }
  }

  (create, equal, delete)
}

/// Index `items` by `key`; the first occurrence of a key wins.
fn index<'a, T, F>(items: &'a [T], key: F) -> HashMap<&'a str, &'a T>
where
  F: Fn(&'a T) -> &'a str,
{
  let mut map = HashMap::with_capacity(items.len());
  for item in items {
    map.entry(key(item)).or_insert(item);
  }
  map
}

// ─── Tests ────────────────────────────────────────────────────────────────────
