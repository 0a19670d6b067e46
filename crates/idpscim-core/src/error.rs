//! Error types for `idpscim-core`.

use std::fmt;

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The collaborator call that failed during a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
  ProviderGetGroups,
  ProviderGetUsers,
  ProviderGetGroupMembers,
  ProviderGetUsersByGroupsMembers,
  ScimGetGroups,
  ScimGetUsers,
  ScimGetGroupsMembers,
  ScimCreateGroups,
  ScimUpdateGroups,
  ScimDeleteGroups,
  ScimCreateUsers,
  ScimUpdateUsers,
  ScimDeleteUsers,
  ScimCreateGroupsMembers,
  ScimDeleteGroupsMembers,
  GetState,
  StoreState,
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Self::ProviderGetGroups => "getting groups from the identity provider",
      Self::ProviderGetUsers => "getting users from the identity provider",
      Self::ProviderGetGroupMembers => {
        "getting group members from the identity provider"
      }
      Self::ProviderGetUsersByGroupsMembers => {
        "getting users by groups members from the identity provider"
      }
      Self::ScimGetGroups => "getting groups from the SCIM service",
      Self::ScimGetUsers => "getting users from the SCIM service",
      Self::ScimGetGroupsMembers => "getting groups members from the SCIM service",
      Self::ScimCreateGroups => "creating groups in the SCIM service",
      Self::ScimUpdateGroups => "updating groups in the SCIM service",
      Self::ScimDeleteGroups => "deleting groups in the SCIM service",
      Self::ScimCreateUsers => "creating users in the SCIM service",
      Self::ScimUpdateUsers => "updating users in the SCIM service",
      Self::ScimDeleteUsers => "deleting users in the SCIM service",
      Self::ScimCreateGroupsMembers => {
        "creating groups members in the SCIM service"
      }
      Self::ScimDeleteGroupsMembers => {
        "deleting groups members in the SCIM service"
      }
      Self::GetState => "getting state from the repository",
      Self::StoreState => "storing state in the repository",
    };
    f.write_str(s)
  }
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("identity provider groups result is nil")]
  IdentityProviderGroupsNil,

  #[error("SCIM groups result is nil")]
  ScimGroupsNil,

  #[error("identity provider users result is nil")]
  IdentityProviderUsersNil,

  #[error("SCIM users result is nil")]
  ScimUsersNil,

  #[error("identity provider groups members result is nil")]
  IdentityProviderGroupsMembersNil,

  #[error("SCIM groups members result is nil")]
  ScimGroupsMembersNil,

  /// A collaborator call failed; nothing after it was attempted.
  #[error("error {stage}: {source}")]
  Collaborator {
    stage:  Stage,
    #[source]
    source: BoxError,
  },
}

impl Error {
  pub(crate) fn collaborator<E>(stage: Stage) -> impl FnOnce(E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    move |e| Self::Collaborator {
      stage,
      source: Box::new(e),
    }
  }

  /// The failing stage, when the error came from a collaborator.
  pub fn stage(&self) -> Option<Stage> {
    match self {
      Self::Collaborator { stage, .. } => Some(*stage),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
