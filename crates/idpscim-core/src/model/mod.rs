//! Entity model: groups, users, members, their result sets, and the state.
//!
//! Entities are value snapshots produced fresh on every run. Each one has a
//! builder whose `build` stamps the hash code; any value assembled by hand
//! must call `set_hash_code` before it takes part in reconciliation.

mod group;
mod group_members;
mod member;
mod result;
mod state;
mod user;

pub use group::{Group, GroupBuilder};
pub use group_members::{GroupMembers, GroupMembersBuilder};
pub use member::{Member, MemberBuilder};
pub use result::{
  GroupsMembersResult, GroupsResult, MembersResult, ResultSet, ResultSetBuilder,
  UsersResult,
};
pub use state::{SCHEMA_VERSION, State, StateBuilder, StateResources};
pub use user::{
  Address, Email, EnterpriseData, Manager, Name, PhoneNumber, User, UserBuilder,
};

use serde::{Deserialize, Deserializer};

use crate::hash::Canonical;

/// An entity that can live inside a [`ResultSet`].
pub trait Resource: Canonical {
  /// The stored hash code, as stamped by the builder.
  fn hash_code(&self) -> &str;

  /// A rebuilt copy with every SCIM id cleared.
  fn without_scimid(&self) -> Self
  where
    Self: Sized;
}

/// Read a JSON `null` array as empty.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
