//! Aggregate result sets.
//!
//! A [`ResultSet`] keeps `items` and `hash_code` consistent with its
//! resources. Its fields are private; the only ways to obtain one are the
//! builder, `From<Vec<T>>`, [`ResultSet::merge`] and deserialisation.

use serde::{Deserialize, Serialize};

use crate::hash::{self, Canonical, Encoder};

use super::{Group, GroupMembers, Member, Resource, User, null_as_empty};

pub type GroupsResult = ResultSet<Group>;
pub type UsersResult = ResultSet<User>;
pub type MembersResult = ResultSet<Member>;
pub type GroupsMembersResult = ResultSet<GroupMembers>;

/// An ordered collection of resources with a count and a content hash.
///
/// The hash is computed over the children's hash codes in sorted order, so
/// two sets with the same elements in a different order hash identically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(
  serialize = "T: Serialize",
  deserialize = "T: Deserialize<'de>"
))]
pub struct ResultSet<T> {
  #[serde(default)]
  items:     usize,
  #[serde(default)]
  hash_code: String,
  #[serde(default, deserialize_with = "null_as_empty")]
  resources: Vec<T>,
}

impl<T: Resource> Default for ResultSet<T> {
  fn default() -> Self { Self::builder().build() }
}

impl<T: Resource> ResultSet<T> {
  pub fn builder() -> ResultSetBuilder<T> {
    ResultSetBuilder {
      resources: Vec::new(),
    }
  }

  pub fn items(&self) -> usize { self.items }

  pub fn hash_code(&self) -> &str { &self.hash_code }

  pub fn resources(&self) -> &[T] { &self.resources }

  pub fn into_resources(self) -> Vec<T> { self.resources }

  pub fn is_empty(&self) -> bool { self.resources.is_empty() }

  pub fn iter(&self) -> std::slice::Iter<'_, T> { self.resources.iter() }

  /// Recompute `items` and `hash_code` from the current resources.
  pub fn set_hash_code(&mut self) {
    self.items = self.resources.len();
    self.hash_code = hash::hash(self);
  }

  /// Concatenate the resources of every part into a single rebuilt set.
  ///
  /// No deduplication is performed; callers pass disjoint parts. The
  /// resulting hash does not depend on the order of `parts`.
  pub fn merge<'a>(parts: impl IntoIterator<Item = &'a Self>) -> Self
  where
    T: Clone + 'a,
  {
    let resources = parts
      .into_iter()
      .flat_map(|part| part.resources.iter().cloned())
      .collect();
    Self::builder().with_resources(resources).build()
  }

  /// A rebuilt copy in which no resource carries a SCIM id.
  pub fn without_scimids(&self) -> Self {
    Self::builder()
      .with_resources(self.resources.iter().map(Resource::without_scimid).collect())
      .build()
  }
}

impl<T: Resource> Canonical for ResultSet<T> {
  fn encode(&self, enc: &mut Encoder) {
    let mut hashes: Vec<&str> =
      self.resources.iter().map(Resource::hash_code).collect();
    hashes.sort_unstable();

    enc.tag("result").count(self.items).count(hashes.len());
    for h in hashes {
      enc.str(h);
    }
  }
}

impl<T: Resource> From<Vec<T>> for ResultSet<T> {
  fn from(resources: Vec<T>) -> Self {
    Self::builder().with_resources(resources).build()
  }
}

impl<T: Resource> FromIterator<T> for ResultSet<T> {
  fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
    Self::from(iter.into_iter().collect::<Vec<_>>())
  }
}

impl<'a, T> IntoIterator for &'a ResultSet<T> {
  type Item = &'a T;
  type IntoIter = std::slice::Iter<'a, T>;

  fn into_iter(self) -> Self::IntoIter { self.resources.iter() }
}

/// Builder for [`ResultSet`]; `build` sets `items` and `hash_code`.
#[derive(Debug)]
pub struct ResultSetBuilder<T> {
  resources: Vec<T>,
}

impl<T: Resource> ResultSetBuilder<T> {
  pub fn with_resources(mut self, resources: Vec<T>) -> Self {
    self.resources = resources;
    self
  }

  pub fn with_resource(mut self, resource: T) -> Self {
    self.resources.push(resource);
    self
  }

  pub fn build(self) -> ResultSet<T> {
    let mut set = ResultSet {
      items:     0,
      hash_code: String::new(),
      resources: self.resources,
    };
    set.set_hash_code();
    set
  }
}
