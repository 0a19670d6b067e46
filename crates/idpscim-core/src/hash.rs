//! Content hashing for entities and result sets.
//!
//! Every hashed type writes its source-of-truth fields into an [`Encoder`]
//! in a fixed order. Target-assigned identifiers (`scimid`) and stored hash
//! codes never participate, so assigning an id never changes an identity.

use sha2::{Digest, Sha256};

/// A type with a canonical binary encoding.
pub trait Canonical {
  fn encode(&self, enc: &mut Encoder);
}

/// Streaming SHA-256 over a length-prefixed field encoding.
///
/// Strings are prefixed with their byte length so that `("ab", "c")` and
/// `("a", "bc")` never collide.
pub struct Encoder {
  hasher: Sha256,
}

impl Default for Encoder {
  fn default() -> Self { Self::new() }
}

impl Encoder {
  pub fn new() -> Self {
    Self {
      hasher: Sha256::new(),
    }
  }

  /// Domain-separation tag written before a type's fields.
  pub fn tag(&mut self, tag: &str) -> &mut Self {
    self.hasher.update([0xFF]);
    self.str(tag)
  }

  pub fn str(&mut self, s: &str) -> &mut Self {
    self.hasher.update((s.len() as u64).to_le_bytes());
    self.hasher.update(s.as_bytes());
    self
  }

  pub fn bool(&mut self, b: bool) -> &mut Self {
    self.hasher.update([u8::from(b)]);
    self
  }

  pub fn count(&mut self, n: usize) -> &mut Self {
    self.hasher.update((n as u64).to_le_bytes());
    self
  }

  pub fn opt<T: Canonical + ?Sized>(&mut self, value: Option<&T>) -> &mut Self {
    match value {
      Some(v) => {
        self.bool(true);
        v.encode(self);
      }
      None => {
        self.bool(false);
      }
    }
    self
  }

  pub fn seq<T: Canonical>(&mut self, items: &[T]) -> &mut Self {
    self.count(items.len());
    for item in items {
      item.encode(self);
    }
    self
  }

  pub fn value<T: Canonical + ?Sized>(&mut self, value: &T) -> &mut Self {
    value.encode(self);
    self
  }

  /// Consume the encoder and return the lowercase hex digest.
  pub fn finish(self) -> String { hex::encode(self.hasher.finalize()) }
}

impl Canonical for str {
  fn encode(&self, enc: &mut Encoder) { enc.str(self); }
}

impl Canonical for String {
  fn encode(&self, enc: &mut Encoder) { enc.str(self); }
}

/// Hash `value` through its canonical encoding.
///
/// Deterministic: equal logical content always yields an equal string.
pub fn hash<T: Canonical + ?Sized>(value: &T) -> String {
  let mut enc = Encoder::new();
  value.encode(&mut enc);
  enc.finish()
}
