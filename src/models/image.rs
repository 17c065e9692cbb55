use serde::{Deserialize, Serialize};

/// An image attached to a story, as the renderer consumes it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoryImage {
    pub image_url: String,
    #[serde(default)]
    pub caption: Option<String>,
    pub display_order: i32,
}

/// Represents a new image record to be inserted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewStoryImage {
    pub post_id: String,
    pub image_url: String,
    pub storage_path: String,
    pub display_order: i32,
}

impl NewStoryImage {
    /// One record per URL, in the given order. The storage path is the last
    /// path segment of the public URL.
    pub fn from_urls(post_id: &str, urls: &[String]) -> Vec<NewStoryImage> {
        urls.iter()
            .enumerate()
            .map(|(index, url)| NewStoryImage {
                post_id: post_id.to_string(),
                image_url: url.clone(),
                storage_path: url.rsplit('/').next().unwrap_or(url).to_string(),
                display_order: index as i32,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_urls_orders_and_derives_path() {
        let urls = vec![
            "https://x.supabase.co/storage/v1/object/public/post-images/a-1-0.jpg".to_string(),
            "https://x.supabase.co/storage/v1/object/public/post-images/a-1-2.png".to_string(),
        ];
        let records = NewStoryImage::from_urls("p1", &urls);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].storage_path, "a-1-0.jpg");
        assert_eq!(records[0].display_order, 0);
        assert_eq!(records[1].storage_path, "a-1-2.png");
        assert_eq!(records[1].display_order, 1);
    }
}
