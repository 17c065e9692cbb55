use super::content::render_content;
use super::date::format_long_date;
use super::html::{escape_html, render_blocking_error};
use crate::models::Story;

pub const STORIES_SECTION_HREF: &str = "projects.html#stories-section";

pub fn render_story_detail(story: &Story) -> String {
    let tags_html: String = story
        .tags
        .iter()
        .map(|tag| format!("<span class=\"story-tag\">{}</span>", escape_html(tag)))
        .collect();

    let title_zh = story
        .title_zh
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(|t| format!("<h2 class=\"story-title-main-zh\">{}</h2>", escape_html(t)))
        .unwrap_or_default();

    let cover = story
        .cover_image_url
        .as_deref()
        .filter(|c| !c.is_empty())
        .map(|url| {
            format!(
                "<div class=\"story-cover-large\" style=\"background-image: url('{}');\"></div>",
                escape_html(url)
            )
        })
        .unwrap_or_default();

    format!(
        "<article class=\"story-detail\">\
         <header class=\"story-header\">\
         <div class=\"story-meta\">\
         <span class=\"story-date\">{date}</span>\
         <div class=\"story-tags\">{tags_html}</div>\
         </div>\
         <h1 class=\"story-title-main\">{title}</h1>\
         {title_zh}\
         </header>\
         {cover}\
         <div class=\"story-content\">{content}</div>\
         </article>",
        date = escape_html(&format_long_date(story.display_date())),
        title = escape_html(&story.title),
        content = render_content(&story.content, &story.images),
    )
}

/// Replaces the article when there is no story to show.
pub fn blocking_message(message: &str) -> String {
    render_blocking_error(message, STORIES_SECTION_HREF, "Back to Stories")
}
