//! Domain entities - the core business objects.

mod event;
mod interaction;
mod page;
mod post;
mod tag;

pub use event::{DomainEvent, EventType};
pub use interaction::{Comment, Like, LikeToggle, View};
pub use page::{Page, Pagination};
pub use post::{Post, Visibility};
pub use tag::{Tag, normalize_tag_names};
