//! SCIM 2.0 wire types (RFC 7643 / RFC 7644), limited to what the sync
//! engine reads and writes.

use idpscim_core::model::{Address, Email, Name, PhoneNumber};
use serde::{Deserialize, Serialize};

pub const USER_SCHEMA: &str = "urn:ietf:params:scim:schemas:core:2.0:User";
pub const ENTERPRISE_USER_SCHEMA: &str =
  "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User";
pub const GROUP_SCHEMA: &str = "urn:ietf:params:scim:schemas:core:2.0:Group";
pub const LIST_RESPONSE_SCHEMA: &str =
  "urn:ietf:params:scim:api:messages:2.0:ListResponse";
pub const PATCH_OP_SCHEMA: &str = "urn:ietf:params:scim:api:messages:2.0:PatchOp";

// ─── Users ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScimUser {
  pub schemas:            Vec<String>,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub id:                 String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub external_id:        String,
  pub user_name:          String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub display_name:       String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub nick_name:          String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub profile_url:        String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub title:              String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub user_type:          String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub preferred_language: String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub locale:             String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub timezone:           String,
  pub active:             bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name:               Option<Name>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub emails:             Vec<Email>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub addresses:          Vec<Address>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub phone_numbers:      Vec<PhoneNumber>,
  #[serde(
    rename = "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User",
    skip_serializing_if = "Option::is_none"
  )]
  pub enterprise:         Option<ScimEnterpriseUser>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScimEnterpriseUser {
  #[serde(skip_serializing_if = "String::is_empty")]
  pub employee_number: String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub cost_center:     String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub organization:    String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub division:        String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub department:      String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub manager:         Option<ScimManager>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScimManager {
  pub value:     String,
  #[serde(rename = "$ref", skip_serializing_if = "String::is_empty")]
  pub reference: String,
}

// ─── Groups ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScimGroup {
  pub schemas:      Vec<String>,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub id:           String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub external_id:  String,
  pub display_name: String,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub members:      Vec<MemberRef>,
}

/// A `members` entry: `value` is the member's SCIM id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemberRef {
  pub value:   String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub display: String,
}

// ─── Messages ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
  #[serde(default)]
  pub schemas:        Vec<String>,
  #[serde(default)]
  pub total_results:  usize,
  #[serde(default)]
  pub start_index:    usize,
  #[serde(default)]
  pub items_per_page: usize,
  #[serde(default = "Vec::new", rename = "Resources")]
  pub resources:      Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchRequest {
  pub schemas:    Vec<String>,
  #[serde(rename = "Operations")]
  pub operations: Vec<PatchOperation>,
}

impl PatchRequest {
  pub fn new(operations: Vec<PatchOperation>) -> Self {
    Self {
      schemas: vec![PATCH_OP_SCHEMA.to_owned()],
      operations,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
  pub op:    String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub path:  Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub value: Option<serde_json::Value>,
}

impl PatchOperation {
  pub fn replace(path: &str, value: impl Into<serde_json::Value>) -> Self {
    Self {
      op:    "replace".to_owned(),
      path:  Some(path.to_owned()),
      value: Some(value.into()),
    }
  }

  /// `add` of the given member ids to `members`.
  pub fn add_members(ids: &[&str]) -> Self { Self::members("add", ids) }

  /// `remove` of the given member ids from `members`.
  pub fn remove_members(ids: &[&str]) -> Self { Self::members("remove", ids) }

  fn members(op: &str, ids: &[&str]) -> Self {
    let refs: Vec<serde_json::Value> = ids
      .iter()
      .map(|id| serde_json::json!({ "value": id }))
      .collect();
    Self {
      op:    op.to_owned(),
      path:  Some("members".to_owned()),
      value: Some(serde_json::Value::Array(refs)),
    }
  }
}
