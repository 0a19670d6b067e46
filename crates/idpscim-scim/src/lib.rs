//! SCIM 2.0 client for the sync engine.
//!
//! [`ScimClient`] speaks the HTTP protocol and implements
//! [`idpscim_core::service::ScimService`] on top of it. Entity conversion
//! lives in [`mapper`]; the wire shapes in [`model`].

pub mod client;
pub mod error;
pub mod mapper;
pub mod model;

mod service;

pub use client::{ScimClient, ScimConfig};
pub use error::{Result, ScimError};

#[cfg(test)]
mod tests;
