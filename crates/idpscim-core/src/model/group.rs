//! Group: a directory group, keyed by name during reconciliation.

use serde::{Deserialize, Serialize};

use crate::hash::{self, Canonical, Encoder};

use super::Resource;

/// A group as seen by the identity provider or the SCIM target.
///
/// `hash_code` covers `ipid`, `name` and `email` only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub ipid:      String,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub scimid:    String,
  pub name:      String,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub email:     String,
  #[serde(default)]
  pub hash_code: String,
}

impl Group {
  pub fn builder() -> GroupBuilder { GroupBuilder::default() }

  /// Recompute `hash_code` from the current field values.
  pub fn set_hash_code(&mut self) { self.hash_code = hash::hash(self); }

  /// A copy carrying `scimid`. The hash is unchanged.
  pub fn with_scimid(&self, scimid: impl Into<String>) -> Self {
    Self {
      scimid: scimid.into(),
      ..self.clone()
    }
  }
}

impl Canonical for Group {
  fn encode(&self, enc: &mut Encoder) {
    enc.tag("group").str(&self.ipid).str(&self.name).str(&self.email);
  }
}

impl Resource for Group {
  fn hash_code(&self) -> &str { &self.hash_code }

  fn without_scimid(&self) -> Self {
    Self::builder()
      .with_ipid(&self.ipid)
      .with_name(&self.name)
      .with_email(&self.email)
      .build()
  }
}

/// Builder for [`Group`]; [`GroupBuilder::build`] stamps the hash code.
#[derive(Debug, Default)]
pub struct GroupBuilder {
  group: Group,
}

impl GroupBuilder {
  pub fn with_ipid(mut self, ipid: impl Into<String>) -> Self {
    self.group.ipid = ipid.into();
    self
  }

  pub fn with_scimid(mut self, scimid: impl Into<String>) -> Self {
    self.group.scimid = scimid.into();
    self
  }

  pub fn with_name(mut self, name: impl Into<String>) -> Self {
    self.group.name = name.into();
    self
  }

  pub fn with_email(mut self, email: impl Into<String>) -> Self {
    self.group.email = email.into();
    self
  }

  pub fn build(mut self) -> Group {
    self.group.set_hash_code();
    self.group
  }
}
