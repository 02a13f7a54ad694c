//! Extractors and error mapping shared by the handlers.

pub mod deadline;
pub mod error;
pub mod identity;

pub use deadline::RequestDeadline;
pub use error::{AppError, AppResult};
pub use identity::CallerId;
