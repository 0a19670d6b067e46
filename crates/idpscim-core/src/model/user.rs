//! User: a directory account, keyed by primary email during reconciliation.

use serde::{Deserialize, Serialize};

use crate::hash::{self, Canonical, Encoder};

use super::Resource;

// ─── Sub-types ───────────────────────────────────────────────────────────────

/// Structured name components.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Name {
  #[serde(skip_serializing_if = "String::is_empty")]
  pub formatted:        String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub family_name:      String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub given_name:       String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub middle_name:      String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub honorific_prefix: String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub honorific_suffix: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Email {
  pub value:   String,
  #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
  pub kind:    String,
  pub primary: bool,
}

impl Email {
  pub fn new(value: impl Into<String>, kind: impl Into<String>, primary: bool) -> Self {
    Self {
      value: value.into(),
      kind: kind.into(),
      primary,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Address {
  #[serde(skip_serializing_if = "String::is_empty")]
  pub formatted:      String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub street_address: String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub locality:       String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub region:         String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub postal_code:    String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub country:        String,
  #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
  pub kind:           String,
  pub primary:        bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhoneNumber {
  pub value: String,
  #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
  pub kind:  String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Manager {
  pub value: String,
  #[serde(rename = "ref", skip_serializing_if = "String::is_empty")]
  pub reference: String,
}

/// Attributes of the SCIM enterprise user extension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnterpriseData {
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
  pub manager:         Option<Manager>,
}

impl Canonical for Name {
  fn encode(&self, enc: &mut Encoder) {
    enc
      .tag("name")
      .str(&self.formatted)
      .str(&self.family_name)
      .str(&self.given_name)
      .str(&self.middle_name)
      .str(&self.honorific_prefix)
      .str(&self.honorific_suffix);
  }
}

impl Canonical for Email {
  fn encode(&self, enc: &mut Encoder) {
    enc.tag("email").str(&self.value).str(&self.kind).bool(self.primary);
  }
}

impl Canonical for Address {
  fn encode(&self, enc: &mut Encoder) {
    enc
      .tag("address")
      .str(&self.formatted)
      .str(&self.street_address)
      .str(&self.locality)
      .str(&self.region)
      .str(&self.postal_code)
      .str(&self.country)
      .str(&self.kind)
      .bool(self.primary);
  }
}

impl Canonical for PhoneNumber {
  fn encode(&self, enc: &mut Encoder) {
    enc.tag("phone").str(&self.value).str(&self.kind);
  }
}

impl Canonical for Manager {
  fn encode(&self, enc: &mut Encoder) {
    enc.tag("manager").str(&self.value).str(&self.reference);
  }
}

impl Canonical for EnterpriseData {
  fn encode(&self, enc: &mut Encoder) {
    enc
      .tag("enterprise")
      .str(&self.employee_number)
      .str(&self.cost_center)
      .str(&self.organization)
      .str(&self.division)
      .str(&self.department)
      .opt(self.manager.as_ref());
  }
}

// ─── User ────────────────────────────────────────────────────────────────────

/// A user account. `hash_code` covers every field except `scimid`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct User {
  #[serde(skip_serializing_if = "String::is_empty")]
  pub ipid:               String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub scimid:             String,
  pub user_name:          String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub display_name:       String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub nick_name:          String,
  #[serde(rename = "profileURL", skip_serializing_if = "String::is_empty")]
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
  pub emails:             Vec<Email>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub addresses:          Vec<Address>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub phone_numbers:      Vec<PhoneNumber>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub enterprise_data:    Option<EnterpriseData>,
  pub hash_code:          String,
}

impl User {
  pub fn builder() -> UserBuilder { UserBuilder::default() }

  pub fn set_hash_code(&mut self) { self.hash_code = hash::hash(self); }

  pub fn with_scimid(&self, scimid: impl Into<String>) -> Self {
    Self {
      scimid: scimid.into(),
      ..self.clone()
    }
  }

  /// The value of the first email flagged primary, or `""` when none is.
  pub fn primary_email(&self) -> &str {
    self
      .emails
      .iter()
      .find(|e| e.primary)
      .map_or("", |e| e.value.as_str())
  }
}

impl Canonical for User {
  fn encode(&self, enc: &mut Encoder) {
    enc
      .tag("user")
      .str(&self.ipid)
      .str(&self.user_name)
      .str(&self.display_name)
      .str(&self.nick_name)
      .str(&self.profile_url)
      .str(&self.title)
      .str(&self.user_type)
      .str(&self.preferred_language)
      .str(&self.locale)
      .str(&self.timezone)
      .bool(self.active)
      .opt(self.name.as_ref())
      .seq(&self.emails)
      .seq(&self.addresses)
      .seq(&self.phone_numbers)
      .opt(self.enterprise_data.as_ref());
  }
}

impl Resource for User {
  fn hash_code(&self) -> &str { &self.hash_code }

  fn without_scimid(&self) -> Self {
    let mut user = Self {
      scimid: String::new(),
      ..self.clone()
    };
    user.set_hash_code();
    user
  }
}

// ─── Builder ─────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct UserBuilder {
  user: User,
}

impl UserBuilder {
  pub fn with_ipid(mut self, ipid: impl Into<String>) -> Self {
    self.user.ipid = ipid.into();
    self
  }

  pub fn with_scimid(mut self, scimid: impl Into<String>) -> Self {
    self.user.scimid = scimid.into();
    self
  }

  pub fn with_user_name(mut self, user_name: impl Into<String>) -> Self {
    self.user.user_name = user_name.into();
    self
  }

  pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
    self.user.display_name = display_name.into();
    self
  }

  pub fn with_nick_name(mut self, nick_name: impl Into<String>) -> Self {
    self.user.nick_name = nick_name.into();
    self
  }

  pub fn with_profile_url(mut self, profile_url: impl Into<String>) -> Self {
    self.user.profile_url = profile_url.into();
    self
  }

  pub fn with_title(mut self, title: impl Into<String>) -> Self {
    self.user.title = title.into();
    self
  }

  pub fn with_user_type(mut self, user_type: impl Into<String>) -> Self {
    self.user.user_type = user_type.into();
    self
  }

  pub fn with_preferred_language(mut self, lang: impl Into<String>) -> Self {
    self.user.preferred_language = lang.into();
    self
  }

  pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
    self.user.locale = locale.into();
    self
  }

  pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
    self.user.timezone = timezone.into();
    self
  }

  pub fn with_active(mut self, active: bool) -> Self {
    self.user.active = active;
    self
  }

  pub fn with_name(mut self, name: Name) -> Self {
    self.user.name = Some(name);
    self
  }

  pub fn with_emails(mut self, emails: Vec<Email>) -> Self {
    self.user.emails = emails;
    self
  }

  pub fn with_addresses(mut self, addresses: Vec<Address>) -> Self {
    self.user.addresses = addresses;
    self
  }

  pub fn with_phone_numbers(mut self, phone_numbers: Vec<PhoneNumber>) -> Self {
    self.user.phone_numbers = phone_numbers;
    self
  }

  pub fn with_enterprise_data(mut self, data: EnterpriseData) -> Self {
    self.user.enterprise_data = Some(data);
    self
  }

  pub fn build(mut self) -> User {
    self.user.set_hash_code();
    self.user
  }
}
