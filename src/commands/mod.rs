pub mod admin;
pub mod featured;
mod notice;
pub mod stories;
pub mod story;
pub mod submit;

pub use admin::{AdminConsole, AdminView, StatusChange};
pub use featured::load_featured_stories;
pub use notice::{Notice, NoticeKind};
pub use stories::load_stories;
pub use story::{load_story, story_id_from_url, StoryPage};
pub use submit::handle_submit;
