//! Merging partitions back into totals, and threading SCIM ids assigned
//! during a run into provider-side membership data.

use std::collections::HashMap;

use crate::model::{
  Group, GroupMembers, GroupsMembersResult, GroupsResult, Member, ResultSet,
  User, UsersResult,
};

/// Union of group result sets. Inputs must be disjoint.
pub fn merge_groups_result(parts: &[&GroupsResult]) -> GroupsResult {
  ResultSet::merge(parts.iter().copied())
}

/// Union of user result sets. Inputs must be disjoint.
pub fn merge_users_result(parts: &[&UsersResult]) -> UsersResult {
  ResultSet::merge(parts.iter().copied())
}

/// Union of membership result sets. Inputs must be disjoint.
pub fn merge_groups_members_result(
  parts: &[&GroupsMembersResult],
) -> GroupsMembersResult {
  ResultSet::merge(parts.iter().copied())
}

/// Fold entries that share a group name into one entry per group.
///
/// Groups keep their first-seen order. The first group carrying a SCIM id
/// wins, and members are concatenated in order.
pub fn fold_groups_members(set: &GroupsMembersResult) -> GroupsMembersResult {
  let mut order: Vec<&str> = vec![];
  let mut folded: HashMap<&str, (Group, Vec<Member>)> = HashMap::new();

  for gm in set {
    let name = gm.group().name.as_str();
    let (group, members) = folded.entry(name).or_insert_with(|| {
      order.push(name);
      (gm.group().clone(), vec![])
    });
    if group.scimid.is_empty() && !gm.group().scimid.is_empty() {
      *group = gm.group().clone();
    }
    members.extend(gm.resources().iter().cloned());
  }

  order
    .into_iter()
    .filter_map(|name| folded.remove(name))
    .map(|(group, members)| {
      GroupMembers::builder()
        .with_group(group)
        .with_resources(members)
        .build()
    })
    .collect()
}

/// Rebuild `idp` with group and member SCIM ids taken from the target side.
///
/// Groups are looked up by name and members by their user's primary email.
/// Entries with no counterpart keep whatever id they already carried.
pub fn update_groups_members_scimid(
  idp: &GroupsMembersResult,
  groups: &GroupsResult,
  users: &UsersResult,
) -> GroupsMembersResult {
  let mut group_by_name: HashMap<&str, &Group> = HashMap::new();
  for group in groups {
    group_by_name.entry(group.name.as_str()).or_insert(group);
  }
  let mut user_by_email: HashMap<&str, &User> = HashMap::new();
  for user in users {
    user_by_email.entry(user.primary_email()).or_insert(user);
  }

  idp
    .iter()
    .map(|gm| {
      let source = gm.group();
      let group = match group_by_name.get(source.name.as_str()) {
        Some(known) => source.with_scimid(&known.scimid),
        None => source.clone(),
      };

      let members: Vec<Member> = gm
        .resources()
        .iter()
        .map(|m| match user_by_email.get(m.email.as_str()) {
          Some(user) => m.with_scimid(&user.scimid),
          None => m.clone(),
        })
        .collect();

      GroupMembers::builder()
        .with_group(group)
        .with_resources(members)
        .build()
    })
    .collect()
}
