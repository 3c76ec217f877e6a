use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Longest visible label for a rewritten URL before truncation kicks in.
const URL_LABEL_MAX: usize = 25;

/// Escape the three characters that would let remote text inject markup.
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

fn url_pattern() -> &'static Regex {
    static URL: OnceLock<Regex> = OnceLock::new();
    URL.get_or_init(|| {
        Regex::new(r"(?i)(?:(?:https?|ftp)://)?[\w/\-?=%.]+\.[\w/\-?=%]+").expect("url pattern")
    })
}

/// Sanitize, then rewrite URL-like substrings into link markup. The visible
/// label drops a leading `https://` and is cut to 25 characters plus an
/// ellipsis entity when longer; the href keeps the full URL, prefixed with
/// `http://` when the match carries no scheme.
pub fn linkify(text: &str) -> String {
    let sanitized = sanitize(text);
    url_pattern()
        .replace_all(&sanitized, |caps: &Captures<'_>| {
            let matched = caps[0].trim();

            let mut label = matched.strip_prefix("https://").unwrap_or(matched).to_owned();
            if label.chars().count() > URL_LABEL_MAX {
                label = label.chars().take(URL_LABEL_MAX).collect();
                label.push_str("&hellip;");
            }

            let lower = matched.to_ascii_lowercase();
            let href = if lower.starts_with("http://")
                || lower.starts_with("https://")
                || lower.starts_with("ftp://")
            {
                matched.to_owned()
            } else {
                format!("http://{matched}")
            };

            format!(r#"<a href="{href}" target="_blank" class="link" rel="noopener">{label}</a>"#)
        })
        .into_owned()
}
