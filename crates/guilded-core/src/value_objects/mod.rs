//! Value objects - immutable types that represent domain concepts

mod content;
mod presence;

pub use content::{ContentId, ContentKind};
pub use presence::Presence;
