//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod events;
mod repository;

pub use events::{EventPublisher, PublishError};
pub use repository::{CommentRepository, LikeRepository, PostQuery, PostRepository, ViewRepository};
