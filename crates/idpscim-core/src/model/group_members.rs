//! GroupMembers: one group together with its members.

use serde::{Deserialize, Serialize};

use crate::hash::{self, Canonical, Encoder};

use super::{Group, Member, Resource, null_as_empty};

/// A group and the members that belong to it.
///
/// The hash covers the group's source fields and the members ordered by
/// email, so member order and SCIM ids never affect it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMembers {
  #[serde(default)]
  items:     usize,
  #[serde(default)]
  hash_code: String,
  group:     Group,
  #[serde(default, deserialize_with = "null_as_empty")]
  resources: Vec<Member>,
}

impl GroupMembers {
  pub fn builder() -> GroupMembersBuilder { GroupMembersBuilder::default() }

  pub fn items(&self) -> usize { self.items }

  pub fn group(&self) -> &Group { &self.group }

  pub fn resources(&self) -> &[Member] { &self.resources }

  pub fn into_parts(self) -> (Group, Vec<Member>) { (self.group, self.resources) }

  pub fn set_hash_code(&mut self) {
    self.items = self.resources.len();
    self.hash_code = hash::hash(self);
  }
}

impl Canonical for GroupMembers {
  fn encode(&self, enc: &mut Encoder) {
    let mut members: Vec<&Member> = self.resources.iter().collect();
    members.sort_by(|a, b| {
      a.email
        .cmp(&b.email)
        .then_with(|| a.hash_code.cmp(&b.hash_code))
    });

    enc
      .tag("group_members")
      .count(self.items)
      .value(&self.group)
      .count(members.len());
    for member in members {
      enc.value(member);
    }
  }
}

impl Resource for GroupMembers {
  fn hash_code(&self) -> &str { &self.hash_code }

  fn without_scimid(&self) -> Self {
    Self::builder()
      .with_group(self.group.without_scimid())
      .with_resources(self.resources.iter().map(Resource::without_scimid).collect())
      .build()
  }
}

#[derive(Debug, Default)]
pub struct GroupMembersBuilder {
  group:     Group,
  resources: Vec<Member>,
}

impl GroupMembersBuilder {
  pub fn with_group(mut self, group: Group) -> Self {
    self.group = group;
    self
  }

  pub fn with_resources(mut self, resources: Vec<Member>) -> Self {
    self.resources = resources;
    self
  }

  pub fn with_resource(mut self, member: Member) -> Self {
    self.resources.push(member);
    self
  }

  pub fn build(self) -> GroupMembers {
    let mut gm = GroupMembers {
      items:     0,
      hash_code: String::new(),
      group:     self.group,
      resources: self.resources,
    };
    gm.set_hash_code();
    gm
  }
}
