use crate::render::escape_html;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// A banner shown after a user action.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    /// `None` keeps the banner until the next action.
    pub dismiss_after: Option<Duration>,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Notice {
            kind: NoticeKind::Success,
            message: message.into(),
            dismiss_after: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notice {
            kind: NoticeKind::Error,
            message: message.into(),
            dismiss_after: None,
        }
    }

    pub fn dismiss_after_secs(mut self, secs: u64) -> Self {
        self.dismiss_after = Some(Duration::from_secs(secs));
        self
    }

    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }

    pub fn render(&self) -> String {
        let (id, class) = match self.kind {
            NoticeKind::Success => ("success-message", "success-message"),
            NoticeKind::Error => ("error-message", "error-message"),
        };
        format!(
            "<div id=\"{}\" class=\"{}\" style=\"display: block;\">{}</div>",
            id,
            class,
            escape_html(&self.message)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_render_escapes() {
        let notice = Notice::error("bad <input>").dismiss_after_secs(5);
        assert_eq!(notice.dismiss_after, Some(Duration::from_secs(5)));
        assert!(notice.render().contains("bad &lt;input&gt;"));
        assert!(notice.render().starts_with("<div id=\"error-message\""));
    }
}
