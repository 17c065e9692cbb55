/// Escapes text for use in element content and quoted attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// A centered notice paragraph, used where a list would otherwise be.
pub fn render_message(message: &str) -> String {
    format!(
        "<p style=\"text-align: center; color: var(--color-text-light);\">{}</p>",
        escape_html(message)
    )
}

/// A message that replaces a whole page region, with a way back to a safe page.
pub fn render_blocking_error(message: &str, back_href: &str, back_label: &str) -> String {
    format!(
        "<div style=\"text-align: center; padding: var(--spacing-xl);\">\
         <p style=\"color: var(--color-text-light); margin-bottom: var(--spacing-md);\">{}</p>\
         <a href=\"{}\" class=\"btn btn-primary\">{}</a>\
         </div>",
        escape_html(message),
        escape_html(back_href),
        escape_html(back_label)
    )
}
