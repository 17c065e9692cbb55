use super::date::format_date_time;
use super::html::escape_html;
use crate::models::{ContentBlock, Story, StoryStatus};

const NO_EXCERPT: &str = "No excerpt";

fn review_excerpt(story: &Story, max_chars: usize) -> String {
    if let Some(excerpt) = story.excerpt.as_deref().filter(|e| !e.is_empty()) {
        return excerpt.to_string();
    }
    match story.content.first() {
        Some(ContentBlock::Paragraph { text }) | Some(ContentBlock::Heading { text, .. }) => {
            text.chars().take(max_chars).collect()
        }
        _ => NO_EXCERPT.to_string(),
    }
}

/// One entry of the moderation queue, with the actions its status allows.
pub fn render_moderation_card(story: &Story, excerpt_length: usize) -> String {
    let status_class = match story.status {
        StoryStatus::Approved => "approved",
        StoryStatus::Rejected => "rejected",
        StoryStatus::Pending => "",
    };
    let id = escape_html(&story.id);

    let mut meta = format!(
        "<span class=\"status-badge status-{}\">{}</span><span>Submitted: {}</span>",
        story.status,
        story.status.as_str().to_uppercase(),
        escape_html(&format_date_time(story.created_at))
    );
    if let Some(name) = story.author_name.as_deref().filter(|n| !n.is_empty()) {
        meta.push_str(&format!("<span>Author: {}</span>", escape_html(name)));
    }
    if let Some(email) = story.author_email.as_deref().filter(|e| !e.is_empty()) {
        meta.push_str(&format!("<span>Email: {}</span>", escape_html(email)));
    }

    let title_zh = story
        .title_zh
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(|t| {
            format!(
                "<h4 style=\"color: var(--color-text-light); font-weight: 400;\">{}</h4>",
                escape_html(t)
            )
        })
        .unwrap_or_default();

    let tags = if story.tags.is_empty() {
        "No tags".to_string()
    } else {
        story.tags.join(", ")
    };
    let district = story
        .project_district
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or("N/A");

    let mut actions = String::new();
    if story.status != StoryStatus::Approved {
        actions.push_str(&format!(
            "<button id=\"approve-{}\" class=\"btn btn-primary\">Approve</button>",
            id
        ));
    }
    if story.status != StoryStatus::Rejected {
        actions.push_str(&format!(
            "<button id=\"reject-{}\" class=\"btn btn-secondary\">Reject</button>",
            id
        ));
    }
    actions.push_str(&format!(
        "<a href=\"story.html?id={}\" class=\"btn btn-outline\" target=\"_blank\">View Full Story</a>",
        id
    ));

    format!(
        "<div class=\"post-item {status_class}\">\
         <div class=\"post-meta\">{meta}</div>\
         <h3>{title}</h3>\
         {title_zh}\
         <p style=\"color: var(--color-text-light); margin: var(--spacing-sm) 0;\">{excerpt}...</p>\
         <p style=\"font-size: 0.9rem; color: var(--color-text-light);\"><strong>Tags:</strong> {tags}</p>\
         <p style=\"font-size: 0.9rem; color: var(--color-text-light);\"><strong>District:</strong> {district}</p>\
         <div class=\"post-actions\">{actions}</div>\
         </div>",
        title = escape_html(&story.title),
        excerpt = escape_html(&review_excerpt(story, excerpt_length)),
        tags = escape_html(&tags),
        district = escape_html(district),
    )
}
