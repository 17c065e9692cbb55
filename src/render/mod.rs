mod cards;
mod content;
mod date;
mod detail;
mod html;
mod moderation;
pub mod schema;

pub use cards::{render_cards, render_story_card, truncate_chars, CardOptions, StoryCard};
pub use content::render_content;
pub use date::{format_date_time, format_long_date};
pub use detail::{blocking_message, render_story_detail, STORIES_SECTION_HREF};
pub use html::{escape_html, render_blocking_error, render_message};
pub use moderation::render_moderation_card;
pub use schema::{article_schema, render_schema_script, PageMeta};
