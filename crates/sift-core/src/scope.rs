//! Time-bounded identifier sets.

use std::collections::HashSet;

use crate::identifier::Identifier;

/// A set of identifiers bounded by a time window (day or month) and owned by
/// a single sender. Rollover clears the whole set at once; entries are never
/// removed individually.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeSet(HashSet<Identifier>);

impl ScopeSet {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn contains(&self, id: &Identifier) -> bool {
    self.0.contains(id)
  }

  /// Returns `true` if the identifier was not already present.
  pub fn insert(&mut self, id: Identifier) -> bool {
    self.0.insert(id)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn clear(&mut self) {
    self.0.clear()
  }

  pub fn iter(&self) -> impl Iterator<Item = &Identifier> {
    self.0.iter()
  }
}

impl FromIterator<Identifier> for ScopeSet {
  fn from_iter<I: IntoIterator<Item = Identifier>>(iter: I) -> Self {
    Self(iter.into_iter().collect())
  }
}
