//! Member: a reference to a user inside one group's membership.

use serde::{Deserialize, Serialize};

use crate::hash::{self, Canonical, Encoder};

use super::Resource;

/// A group member, keyed by `email` during reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub ipid:      String,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub scimid:    String,
  pub email:     String,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub status:    String,
  #[serde(default)]
  pub hash_code: String,
}

impl Member {
  pub fn builder() -> MemberBuilder { MemberBuilder::default() }

  pub fn set_hash_code(&mut self) { self.hash_code = hash::hash(self); }

  pub fn with_scimid(&self, scimid: impl Into<String>) -> Self {
    Self {
      scimid: scimid.into(),
      ..self.clone()
    }
  }
}

impl Canonical for Member {
  fn encode(&self, enc: &mut Encoder) {
    enc
      .tag("member")
      .str(&self.ipid)
      .str(&self.email)
      .str(&self.status);
  }
}

impl Resource for Member {
  fn hash_code(&self) -> &str { &self.hash_code }

  fn without_scimid(&self) -> Self {
    Self::builder()
      .with_ipid(&self.ipid)
      .with_email(&self.email)
      .with_status(&self.status)
      .build()
  }
}

#[derive(Debug, Default)]
pub struct MemberBuilder {
  member: Member,
}

impl MemberBuilder {
  pub fn with_ipid(mut self, ipid: impl Into<String>) -> Self {
    self.member.ipid = ipid.into();
    self
  }

  pub fn with_scimid(mut self, scimid: impl Into<String>) -> Self {
    self.member.scimid = scimid.into();
    self
  }

  pub fn with_email(mut self, email: impl Into<String>) -> Self {
    self.member.email = email.into();
    self
  }

  pub fn with_status(mut self, status: impl Into<String>) -> Self {
    self.member.status = status.into();
    self
  }

  pub fn build(mut self) -> Member {
    self.member.set_hash_code();
    self.member
  }
}
