//! Collaborator traits consumed by the sync orchestrator.
//!
//! Concrete identity provider clients, SCIM clients and state backends live
//! in other crates. The orchestrator depends only on these abstractions.

use std::future::Future;

use crate::model::{
  GroupsMembersResult, GroupsResult, MembersResult, State, UsersResult,
};

// ─── Identity provider ───────────────────────────────────────────────────────

/// Read-only access to the identity provider directory.
pub trait IdentityProviderService: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Groups matching any of `filter`; all groups when `filter` is empty.
  fn get_groups<'a>(
    &'a self,
    filter: &'a [String],
  ) -> impl Future<Output = Result<GroupsResult, Self::Error>> + Send + 'a;

  /// Users matching any of `filter`; all users when `filter` is empty.
  fn get_users<'a>(
    &'a self,
    filter: &'a [String],
  ) -> impl Future<Output = Result<UsersResult, Self::Error>> + Send + 'a;

  /// Members of the group with identity provider id `group_id`.
  fn get_group_members<'a>(
    &'a self,
    group_id: &'a str,
  ) -> impl Future<Output = Result<MembersResult, Self::Error>> + Send + 'a;

  /// The users referenced by any member in `groups_members`.
  fn get_users_by_groups_members<'a>(
    &'a self,
    groups_members: &'a GroupsMembersResult,
  ) -> impl Future<Output = Result<UsersResult, Self::Error>> + Send + 'a;
}

// ─── SCIM target ─────────────────────────────────────────────────────────────

/// The SCIM-speaking target system.
///
/// Create and update calls return their input annotated with the SCIM ids
/// assigned by the target.
pub trait ScimService: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Reads (first run only) ────────────────────────────────────────────

  fn get_groups(
    &self,
  ) -> impl Future<Output = Result<GroupsResult, Self::Error>> + Send + '_;

  fn get_users(
    &self,
  ) -> impl Future<Output = Result<UsersResult, Self::Error>> + Send + '_;

  /// Membership of `groups`. `users` resolves member ids to emails.
  fn get_groups_members<'a>(
    &'a self,
    groups: &'a GroupsResult,
    users: &'a UsersResult,
  ) -> impl Future<Output = Result<GroupsMembersResult, Self::Error>> + Send + 'a;

  // ── Groups ────────────────────────────────────────────────────────────

  fn create_groups<'a>(
    &'a self,
    groups: &'a GroupsResult,
  ) -> impl Future<Output = Result<GroupsResult, Self::Error>> + Send + 'a;

  fn update_groups<'a>(
    &'a self,
    groups: &'a GroupsResult,
  ) -> impl Future<Output = Result<GroupsResult, Self::Error>> + Send + 'a;

  fn delete_groups<'a>(
    &'a self,
    groups: &'a GroupsResult,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Users ─────────────────────────────────────────────────────────────

  fn create_users<'a>(
    &'a self,
    users: &'a UsersResult,
  ) -> impl Future<Output = Result<UsersResult, Self::Error>> + Send + 'a;

  fn update_users<'a>(
    &'a self,
    users: &'a UsersResult,
  ) -> impl Future<Output = Result<UsersResult, Self::Error>> + Send + 'a;

  fn delete_users<'a>(
    &'a self,
    users: &'a UsersResult,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Membership ────────────────────────────────────────────────────────

  fn create_groups_members<'a>(
    &'a self,
    groups_members: &'a GroupsMembersResult,
  ) -> impl Future<Output = Result<GroupsMembersResult, Self::Error>> + Send + 'a;

  fn delete_groups_members<'a>(
    &'a self,
    groups_members: &'a GroupsMembersResult,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

// ─── State repository ────────────────────────────────────────────────────────

/// Where a stored state ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStateResult {
  pub location: String,
}

/// Durable storage for the sync [`State`].
pub trait StateRepository: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The last stored state, or `None` if nothing has been stored yet.
  fn get_state(
    &self,
  ) -> impl Future<Output = Result<Option<State>, Self::Error>> + Send + '_;

  /// Replace the stored state wholesale.
  fn store_state<'a>(
    &'a self,
    state: &'a State,
  ) -> impl Future<Output = Result<StoreStateResult, Self::Error>> + Send + 'a;
}
