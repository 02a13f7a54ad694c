//! # Agora Core
//!
//! The domain layer of the Agora post service.
//! This crate contains the entity model, the ports infrastructure must
//! implement, and the request-layer policy (`PostService`). It has zero
//! infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use error::{DomainError, RepoError};
pub use service::PostService;
