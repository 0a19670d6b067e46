//! [`ScimService`] for [`ScimClient`].
//!
//! Batches are applied one resource at a time, in input order. The first
//! failure aborts the batch.

use std::collections::HashMap;

use idpscim_core::{
  model::{
    Group, GroupMembers, GroupsMembersResult, GroupsResult, Member, User,
    UsersResult,
  },
  service::ScimService,
};
use tracing::{debug, info, warn};

use crate::{
  Result, ScimClient, ScimError,
  mapper::{group_from_scim, group_to_scim, user_from_scim, user_to_scim},
  model::{PatchOperation, PatchRequest},
};

fn group_scimid(group: &Group) -> Result<&str> {
  if group.scimid.is_empty() {
    return Err(ScimError::MissingScimId {
      kind: "group",
      name: group.name.clone(),
    });
  }
  Ok(&group.scimid)
}

fn user_scimid(user: &User) -> Result<&str> {
  if user.scimid.is_empty() {
    return Err(ScimError::MissingScimId {
      kind: "user",
      name: user.user_name.clone(),
    });
  }
  Ok(&user.scimid)
}

fn member_scimids(gm: &GroupMembers) -> Result<Vec<&str>> {
  gm.resources()
    .iter()
    .map(|m| {
      if m.scimid.is_empty() {
        Err(ScimError::MissingScimId {
          kind: "member",
          name: m.email.clone(),
        })
      } else {
        Ok(m.scimid.as_str())
      }
    })
    .collect()
}

impl ScimService for ScimClient {
  type Error = ScimError;

  async fn get_groups(&self) -> Result<GroupsResult> {
    let groups: GroupsResult =
      self.list_groups().await?.into_iter().map(group_from_scim).collect();
    debug!(groups = groups.items(), "listed SCIM groups");
    Ok(groups)
  }

  async fn get_users(&self) -> Result<UsersResult> {
    let users: UsersResult =
      self.list_users().await?.into_iter().map(user_from_scim).collect();
    debug!(users = users.items(), "listed SCIM users");
    Ok(users)
  }

  async fn get_groups_members(
    &self,
    groups: &GroupsResult,
    users: &UsersResult,
  ) -> Result<GroupsMembersResult> {
    let by_scimid: HashMap<&str, &User> =
      users.iter().map(|u| (u.scimid.as_str(), u)).collect();

    let mut out: Vec<GroupMembers> = Vec::with_capacity(groups.items());
    for group in groups {
      let scim = self.get_group(group_scimid(group)?).await?;

      let mut members: Vec<Member> = Vec::with_capacity(scim.members.len());
      for member in &scim.members {
        match by_scimid.get(member.value.as_str()) {
          Some(user) => members.push(
            Member::builder()
              .with_ipid(&user.ipid)
              .with_scimid(&user.scimid)
              .with_email(user.primary_email())
              .build(),
          ),
          None => warn!(
            group = %group.name,
            member = %member.value,
            "group member is not a known user, ignoring"
          ),
        }
      }

      out.push(
        GroupMembers::builder()
          .with_group(group.clone())
          .with_resources(members)
          .build(),
      );
    }
    Ok(out.into())
  }

  async fn create_groups(&self, groups: &GroupsResult) -> Result<GroupsResult> {
    let mut out: Vec<Group> = Vec::with_capacity(groups.items());
    for group in groups {
      let created = self.create_group(&group_to_scim(group)).await?;
      debug!(name = %group.name, scimid = %created.id, "created group");
      out.push(group.with_scimid(created.id));
    }
    info!(groups = out.len(), "created SCIM groups");
    Ok(out.into())
  }

  async fn update_groups(&self, groups: &GroupsResult) -> Result<GroupsResult> {
    for group in groups {
      let patch = PatchRequest::new(vec![
        PatchOperation::replace("externalId", group.ipid.as_str()),
        PatchOperation::replace("displayName", group.name.as_str()),
      ]);
      self.patch_group(group_scimid(group)?, &patch).await?;
      debug!(name = %group.name, "updated group");
    }
    info!(groups = groups.items(), "updated SCIM groups");
    Ok(groups.clone())
  }

  async fn delete_groups(&self, groups: &GroupsResult) -> Result<()> {
    for group in groups {
      self.delete_group(group_scimid(group)?).await?;
      debug!(name = %group.name, "deleted group");
    }
    info!(groups = groups.items(), "deleted SCIM groups");
    Ok(())
  }

  async fn create_users(&self, users: &UsersResult) -> Result<UsersResult> {
    let mut out: Vec<User> = Vec::with_capacity(users.items());
    for user in users {
      let created = self.create_user(&user_to_scim(user)).await?;
      debug!(user_name = %user.user_name, scimid = %created.id, "created user");
      out.push(user.with_scimid(created.id));
    }
    info!(users = out.len(), "created SCIM users");
    Ok(out.into())
  }

  async fn update_users(&self, users: &UsersResult) -> Result<UsersResult> {
    for user in users {
      self.replace_user(user_scimid(user)?, &user_to_scim(user)).await?;
      debug!(user_name = %user.user_name, "updated user");
    }
    info!(users = users.items(), "updated SCIM users");
    Ok(users.clone())
  }

  async fn delete_users(&self, users: &UsersResult) -> Result<()> {
    for user in users {
      self.delete_user(user_scimid(user)?).await?;
      debug!(user_name = %user.user_name, "deleted user");
    }
    info!(users = users.items(), "deleted SCIM users");
    Ok(())
  }

  async fn create_groups_members(
    &self,
    groups_members: &GroupsMembersResult,
  ) -> Result<GroupsMembersResult> {
    for gm in groups_members {
      let ids = member_scimids(gm)?;
      if ids.is_empty() {
        continue;
      }
      let patch = PatchRequest::new(vec![PatchOperation::add_members(&ids)]);
      self.patch_group(group_scimid(gm.group())?, &patch).await?;
      debug!(group = %gm.group().name, members = ids.len(), "added group members");
    }
    Ok(groups_members.clone())
  }

  async fn delete_groups_members(
    &self,
    groups_members: &GroupsMembersResult,
  ) -> Result<()> {
    for gm in groups_members {
      let ids = member_scimids(gm)?;
      if ids.is_empty() {
        continue;
      }
      let patch = PatchRequest::new(vec![PatchOperation::remove_members(&ids)]);
      self.patch_group(group_scimid(gm.group())?, &patch).await?;
      debug!(group = %gm.group().name, members = ids.len(), "removed group members");
    }
    Ok(())
  }
}
