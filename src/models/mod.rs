mod block;
mod image;
mod session;
mod story;
mod tag;

pub use block::ContentBlock;
pub use image::{NewStoryImage, StoryImage};
pub use session::{Role, Session, User, ADMIN_ROLE};
pub use story::{NewStory, StatusUpdate, Story, StoryId, StoryStatus};
pub use tag::Tag;
