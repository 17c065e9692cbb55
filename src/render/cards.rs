use super::date::format_long_date;
use super::html::escape_html;
use crate::models::{Story, StoryId};

/// A story shaped for a listing card.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryCard {
    pub id: StoryId,
    pub title: String,
    pub title_zh: Option<String>,
    pub excerpt: String,
    pub excerpt_zh: Option<String>,
    pub date: String,
    pub cover_image: Option<String>,
    pub tags: Vec<String>,
}

impl StoryCard {
    pub fn from_story(story: &Story, excerpt_length: usize) -> Self {
        let excerpt = match story.excerpt.as_deref().filter(|e| !e.is_empty()) {
            Some(excerpt) => excerpt.to_string(),
            None => story
                .first_paragraph()
                .map(|text| truncate_chars(text, excerpt_length))
                .unwrap_or_default(),
        };

        StoryCard {
            id: story.id.clone(),
            title: story.title.clone(),
            title_zh: story.title_zh.clone().filter(|t| !t.is_empty()),
            excerpt,
            excerpt_zh: story.excerpt_zh.clone().filter(|e| !e.is_empty()),
            date: format_long_date(story.display_date()),
            cover_image: story.cover_image_url.clone().filter(|c| !c.is_empty()),
            tags: story.tags.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardOptions {
    /// `None` shows every tag.
    pub tag_limit: Option<usize>,
    pub show_excerpt_zh: bool,
}

impl CardOptions {
    pub fn full_listing() -> Self {
        CardOptions {
            tag_limit: None,
            show_excerpt_zh: true,
        }
    }

    pub fn compact(tag_limit: usize) -> Self {
        CardOptions {
            tag_limit: Some(tag_limit),
            show_excerpt_zh: false,
        }
    }
}

/// First `max_chars` characters of `text`, with `...` appended only when
/// something was cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

pub fn render_story_card(card: &StoryCard, options: &CardOptions) -> String {
    let tag_limit = options.tag_limit.unwrap_or(usize::MAX);
    let tags_html: String = card
        .tags
        .iter()
        .take(tag_limit)
        .map(|tag| format!("<span class=\"story-tag\">{}</span>", escape_html(tag)))
        .collect();

    let cover_style = card
        .cover_image
        .as_deref()
        .map(|url| format!("background-image: url('{}');", escape_html(url)))
        .unwrap_or_default();

    let title_zh = card
        .title_zh
        .as_deref()
        .map(|t| format!("<h4 class=\"story-title-zh\">{}</h4>", escape_html(t)))
        .unwrap_or_default();

    let excerpt_zh = match (&card.excerpt_zh, options.show_excerpt_zh) {
        (Some(e), true) => format!("<p class=\"story-excerpt-zh\">{}</p>", escape_html(e)),
        _ => String::new(),
    };

    format!(
        "<div class=\"card story-card fade-in\">\
         <div class=\"story-cover\" style=\"{cover_style}\"></div>\
         <div class=\"story-card-content\">\
         <div class=\"story-meta\">\
         <span class=\"story-date\">{date}</span>\
         <div class=\"story-tags\">{tags_html}</div>\
         </div>\
         <h3 class=\"story-title\">{title}</h3>\
         {title_zh}\
         <p class=\"story-excerpt\">{excerpt}</p>\
         {excerpt_zh}\
         <a href=\"story.html?id={id}\" class=\"btn btn-primary\" style=\"margin-top: var(--spacing-sm);\">Read Story</a>\
         </div>\
         </div>",
        date = escape_html(&card.date),
        title = escape_html(&card.title),
        excerpt = escape_html(&card.excerpt),
        id = escape_html(&card.id),
    )
}

/// Renders cards in the order given.
pub fn render_cards(stories: &[Story], excerpt_length: usize, options: &CardOptions) -> String {
    stories
        .iter()
        .map(|story| render_story_card(&StoryCard::from_story(story, excerpt_length), options))
        .collect()
}
