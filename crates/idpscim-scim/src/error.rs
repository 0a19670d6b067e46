//! Error type for `idpscim-scim`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScimError {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// The service answered with a non-2xx status.
  #[error("SCIM service returned {status}: {body}")]
  Status { status: u16, body: String },

  #[error("invalid SCIM response: {0}")]
  Json(#[from] serde_json::Error),

  /// A resource that must already exist in the target has no SCIM id.
  #[error("{kind} {name:?} has no SCIM id")]
  MissingScimId { kind: &'static str, name: String },
}

pub type Result<T, E = ScimError> = std::result::Result<T, E>;
