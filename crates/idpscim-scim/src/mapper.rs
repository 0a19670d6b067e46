//! Conversion between core entities and SCIM wire types.
//!
//! `externalId` carries the identity provider id and `id` the SCIM id.
//! Group names travel as `displayName`. Group emails have no SCIM
//! counterpart and are dropped on the way out.

use idpscim_core::model::{EnterpriseData, Group, Manager, User};

use crate::model::{
  ENTERPRISE_USER_SCHEMA, GROUP_SCHEMA, ScimEnterpriseUser, ScimGroup,
  ScimManager, ScimUser, USER_SCHEMA,
};

// ─── Users ───────────────────────────────────────────────────────────────────

pub fn user_to_scim(user: &User) -> ScimUser {
  let mut schemas = vec![USER_SCHEMA.to_owned()];
  let enterprise = user.enterprise_data.as_ref().map(enterprise_to_scim);
  if enterprise.is_some() {
    schemas.push(ENTERPRISE_USER_SCHEMA.to_owned());
  }

  ScimUser {
    schemas,
    id: user.scimid.clone(),
    external_id: user.ipid.clone(),
    user_name: user.user_name.clone(),
    display_name: user.display_name.clone(),
    nick_name: user.nick_name.clone(),
    profile_url: user.profile_url.clone(),
    title: user.title.clone(),
    user_type: user.user_type.clone(),
    preferred_language: user.preferred_language.clone(),
    locale: user.locale.clone(),
    timezone: user.timezone.clone(),
    active: user.active,
    name: user.name.clone(),
    emails: user.emails.clone(),
    addresses: user.addresses.clone(),
    phone_numbers: user.phone_numbers.clone(),
    enterprise,
  }
}

/// The returned user has its hash code stamped.
pub fn user_from_scim(scim: ScimUser) -> User {
  let mut builder = User::builder()
    .with_ipid(scim.external_id)
    .with_scimid(scim.id)
    .with_user_name(scim.user_name)
    .with_display_name(scim.display_name)
    .with_nick_name(scim.nick_name)
    .with_profile_url(scim.profile_url)
    .with_title(scim.title)
    .with_user_type(scim.user_type)
    .with_preferred_language(scim.preferred_language)
    .with_locale(scim.locale)
    .with_timezone(scim.timezone)
    .with_active(scim.active)
    .with_emails(scim.emails)
    .with_addresses(scim.addresses)
    .with_phone_numbers(scim.phone_numbers);

  if let Some(name) = scim.name {
    builder = builder.with_name(name);
  }
  if let Some(enterprise) = scim.enterprise {
    builder = builder.with_enterprise_data(enterprise_from_scim(enterprise));
  }
  builder.build()
}

fn enterprise_to_scim(data: &EnterpriseData) -> ScimEnterpriseUser {
  ScimEnterpriseUser {
    employee_number: data.employee_number.clone(),
    cost_center:     data.cost_center.clone(),
    organization:    data.organization.clone(),
    division:        data.division.clone(),
    department:      data.department.clone(),
    manager:         data.manager.as_ref().map(|m| ScimManager {
      value:     m.value.clone(),
      reference: m.reference.clone(),
    }),
  }
}

fn enterprise_from_scim(scim: ScimEnterpriseUser) -> EnterpriseData {
  EnterpriseData {
    employee_number: scim.employee_number,
    cost_center:     scim.cost_center,
    organization:    scim.organization,
    division:        scim.division,
    department:      scim.department,
    manager:         scim.manager.map(|m| Manager {
      value:     m.value,
      reference: m.reference,
    }),
  }
}

// ─── Groups ──────────────────────────────────────────────────────────────────

/// The outbound group carries no members; membership is patched separately.
pub fn group_to_scim(group: &Group) -> ScimGroup {
  ScimGroup {
    schemas:      vec![GROUP_SCHEMA.to_owned()],
    id:           group.scimid.clone(),
    external_id:  group.ipid.clone(),
    display_name: group.name.clone(),
    members:      vec![],
  }
}

pub fn group_from_scim(scim: ScimGroup) -> Group {
  Group::builder()
    .with_ipid(scim.external_id)
    .with_scimid(scim.id)
    .with_name(scim.display_name)
    .build()
}
