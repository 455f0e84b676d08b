pub mod feed;
pub mod post;
pub mod state;

pub use feed::{Feed, Feeds, PostRef};
pub use post::{Post, NO_CONTENT_PLACEHOLDER};
pub use state::ReadStatus;
