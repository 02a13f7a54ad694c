//! # Agora Shared
//!
//! Request and response types of the post service HTTP API. Kept free of
//! server dependencies so clients can depend on it alone.

pub mod dto;
pub mod response;

pub use response::ErrorResponse;
