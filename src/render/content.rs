use super::html::escape_html;
use crate::models::{ContentBlock, StoryImage};

const DEFAULT_HEADING_LEVEL: u8 = 2;

/// Renders a story body.
///
/// Image blocks take the next image record (ascending display order) while
/// any remain and only then fall back to the block's own source. The output
/// depends on nothing but the inputs.
pub fn render_content(blocks: &[ContentBlock], images: &[StoryImage]) -> String {
    let mut sorted: Vec<&StoryImage> = images.iter().collect();
    sorted.sort_by_key(|image| image.display_order);
    let mut remaining = sorted.into_iter();

    let mut html = String::new();
    for block in blocks {
        match block {
            ContentBlock::Paragraph { text } => {
                html.push_str(&format!("<p>{}</p>", escape_html(text)));
            }
            ContentBlock::Heading { text, level } => {
                let level = level.unwrap_or(DEFAULT_HEADING_LEVEL).clamp(1, 6);
                html.push_str(&format!("<h{0}>{1}</h{0}>", level, escape_html(text)));
            }
            ContentBlock::Image { src, alt } => {
                if let Some(image) = remaining.next() {
                    html.push_str(&render_record_image(image));
                } else if let Some(src) = src.as_deref().filter(|s| !s.is_empty()) {
                    html.push_str(&format!(
                        "<img src=\"{}\" alt=\"{}\" class=\"story-content-image\" />",
                        escape_html(src),
                        escape_html(alt.as_deref().unwrap_or(""))
                    ));
                }
            }
            ContentBlock::Unknown => {}
        }
    }
    html
}

fn render_record_image(image: &StoryImage) -> String {
    let caption = image.caption.as_deref().filter(|c| !c.is_empty());
    let mut html = format!(
        "<img src=\"{}\" alt=\"{}\" class=\"story-content-image\" />",
        escape_html(&image.image_url),
        escape_html(caption.unwrap_or(""))
    );
    if let Some(caption) = caption {
        html.push_str(&format!(
            "<p class=\"story-image-caption\">{}</p>",
            escape_html(caption)
        ));
    }
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(url: &str, order: i32, caption: Option<&str>) -> StoryImage {
        StoryImage {
            image_url: url.to_string(),
            caption: caption.map(str::to_string),
            display_order: order,
        }
    }

    fn image_block(src: Option<&str>) -> ContentBlock {
        ContentBlock::Image {
            src: src.map(str::to_string),
            alt: Some("inline".to_string()),
        }
    }

    #[test]
    fn test_text_blocks_are_escaped() {
        let blocks = vec![
            ContentBlock::paragraph("Fish & <chips>"),
            ContentBlock::Heading { text: "Night".to_string(), level: None },
            ContentBlock::Heading { text: "Deep".to_string(), level: Some(3) },
        ];
        assert_eq!(
            render_content(&blocks, &[]),
            "<p>Fish &amp; &lt;chips&gt;</p><h2>Night</h2><h3>Deep</h3>"
        );
    }

    #[test]
    fn test_heading_level_is_clamped() {
        let blocks = vec![ContentBlock::Heading { text: "x".to_string(), level: Some(9) }];
        assert_eq!(render_content(&blocks, &[]), "<h6>x</h6>");
    }

    #[test]
    fn test_records_before_embedded_source() {
        let blocks = vec![image_block(Some("inline.jpg")), image_block(Some("inline2.jpg"))];
        let images = vec![
            image("second.jpg", 1, None),
            image("first.jpg", 0, Some("Temple gate")),
        ];

        let html = render_content(&blocks, &images);
        assert_eq!(
            html,
            "<img src=\"first.jpg\" alt=\"Temple gate\" class=\"story-content-image\" />\
             <p class=\"story-image-caption\">Temple gate</p>\
             <img src=\"second.jpg\" alt=\"\" class=\"story-content-image\" />"
        );
        assert!(!html.contains("inline"));
    }

    #[test]
    fn test_falls_back_when_records_exhausted() {
        let blocks = vec![image_block(Some("a.jpg")), image_block(Some("inline.jpg")), image_block(None)];
        let images = vec![image("record.jpg", 0, None)];

        let html = render_content(&blocks, &images);
        assert_eq!(
            html,
            "<img src=\"record.jpg\" alt=\"\" class=\"story-content-image\" />\
             <img src=\"inline.jpg\" alt=\"inline\" class=\"story-content-image\" />"
        );
    }

    #[test]
    fn test_unknown_blocks_render_nothing() {
        let blocks = vec![ContentBlock::Unknown, ContentBlock::paragraph("after")];
        assert_eq!(render_content(&blocks, &[]), "<p>after</p>");
    }

    #[test]
    fn test_rendering_is_repeatable() {
        let blocks = vec![
            ContentBlock::paragraph("One"),
            image_block(Some("x.jpg")),
            ContentBlock::Heading { text: "Two".to_string(), level: Some(4) },
            image_block(None),
        ];
        let images = vec![image("b.jpg", 2, Some("B")), image("a.jpg", 1, None)];
        assert_eq!(render_content(&blocks, &images), render_content(&blocks, &images));
    }
}
