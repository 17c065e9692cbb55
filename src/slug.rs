use regex::Regex;
use std::sync::OnceLock;

pub const FALLBACK_SLUG: &str = "story";

fn disallowed() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9\s-]").expect("valid slug pattern"))
}

fn whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace pattern"))
}

fn hyphens() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-+").expect("valid hyphen pattern"))
}

/// Derives a URL-safe slug from a title.
///
/// The result only ever contains `[a-z0-9-]`, never starts or ends with a
/// hyphen and never has two hyphens in a row. It may be empty when the title
/// has no ASCII letters or digits.
pub fn generate_slug(title: &str) -> String {
    let lower = title.to_lowercase();
    let stripped = disallowed().replace_all(&lower, "");
    let hyphenated = whitespace().replace_all(&stripped, "-");
    let collapsed = hyphens().replace_all(&hyphenated, "-");
    collapsed.trim_matches('-').to_string()
}

/// Like [`generate_slug`], but never empty.
pub fn slug_or_fallback(title: &str) -> String {
    let slug = generate_slug(title);
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_well_formed(slug: &str) -> bool {
        slug.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            && !slug.starts_with('-')
            && !slug.ends_with('-')
            && !slug.contains("--")
    }

    #[test]
    fn test_basic_title() {
        assert_eq!(generate_slug("Night Market Memories"), "night-market-memories");
    }

    #[test]
    fn test_punctuation_and_spacing() {
        assert_eq!(
            generate_slug("  Hello,   World! -- Shilin 2024  "),
            "hello-world-shilin-2024"
        );
    }

    #[test]
    fn test_cjk_only_title_is_empty() {
        assert_eq!(generate_slug("士林夜市"), "");
        assert_eq!(slug_or_fallback("士林夜市"), "story");
    }

    #[test]
    fn test_mixed_script_title() {
        assert_eq!(generate_slug("士林 Shilin 故事"), "shilin");
    }

    #[test]
    fn test_tabs_and_newlines_become_single_hyphen() {
        assert_eq!(generate_slug("a\t\n b"), "a-b");
    }

    #[test]
    fn test_slug_shape_holds_for_awkward_titles() {
        let titles = [
            "",
            "---",
            "- leading and trailing -",
            "a - - b",
            "Ünïcödé Çafé",
            "ÀÉÎ 123 !!! ???",
            "emoji 🎉 party 🎉",
            "UPPER_case_with_underscores",
            "tabs\tand\nnewlines\r\nmixed",
            "İstanbul",
        ];
        for title in titles {
            let slug = generate_slug(title);
            assert!(is_well_formed(&slug), "bad slug {:?} for {:?}", slug, title);
        }
    }
}
