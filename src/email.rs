use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// One hyperlink found in a message body, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkRecord {
    /// Visible anchor text
    pub text: Option<String>,
    /// Raw target URL, possibly malformed
    pub href: Option<String>,
}

impl LinkRecord {
    pub fn new(text: &str, href: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            href: Some(href.to_string()),
        }
    }
}

/// A message as handed over by the extractor. Missing fields are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailRecord {
    /// Caller-chosen message identity, used only for at-most-once scanning
    pub id: Option<String>,
    pub subject: String,
    /// Purported sender address
    pub sender: String,
    /// Human-readable "From" label
    pub sender_display_name: Option<String>,
    /// Plain-text rendering of the body
    pub body: String,
    pub body_html: Option<String>,
    pub links: Vec<LinkRecord>,
}

impl EmailRecord {
    /// Fill `links` from `body_html` when the extractor did not supply any.
    pub fn with_html_links(mut self) -> Self {
        if self.links.is_empty() {
            if let Some(html) = &self.body_html {
                self.links = extract_links(html);
                log::debug!("Extracted {} links from HTML body", self.links.len());
            }
        }
        self
    }

    pub fn display_name(&self) -> &str {
        self.sender_display_name.as_deref().unwrap_or("")
    }
}

/// Scan `<a href="...">text</a>` anchors out of an HTML fragment.
pub fn extract_links(html: &str) -> Vec<LinkRecord> {
    static ANCHOR: OnceLock<Regex> = OnceLock::new();
    let anchor = ANCHOR.get_or_init(|| {
        Regex::new(r#"(?is)<a\b[^>]*?href\s*=\s*["']([^"']*)["'][^>]*>(.*?)</a\s*>"#)
            .expect("anchor pattern is valid")
    });
    static TAG: OnceLock<Regex> = OnceLock::new();
    let tag = TAG.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("tag pattern is valid"));

    anchor
        .captures_iter(html)
        .filter_map(|cap| {
            let href = cap.get(1)?.as_str();
            let inner = cap.get(2).map(|m| m.as_str()).unwrap_or("");
            let text = decode_html_entities(&tag.replace_all(inner, ""));
            Some(LinkRecord {
                text: Some(text.trim().to_string()),
                href: Some(decode_html_entities(href).trim().to_string()),
            })
        })
        .collect()
}

/// Decode the handful of entities phishing kits use to hide link text.
pub fn decode_html_entities(text: &str) -> String {
    static NUMERIC: OnceLock<Regex> = OnceLock::new();
    let numeric = NUMERIC.get_or_init(|| {
        Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").expect("entity pattern is valid")
    });

    let decoded = numeric.replace_all(text, |caps: &regex::Captures| {
        let raw = &caps[1];
        let code = match raw.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => raw.parse::<u32>().ok(),
        };
        code.and_then(char::from_u32)
            .map(|c| c.to_string())
            .unwrap_or_else(|| caps[0].to_string())
    });

    let named = [
        ("&lt;", "<"),
        ("&gt;", ">"),
        ("&quot;", "\""),
        ("&#39;", "'"),
        ("&nbsp;", " "),
        // Last so "&amp;lt;" stays "&lt;"
        ("&amp;", "&"),
    ];

    let mut result = decoded.into_owned();
    for (entity, replacement) in &named {
        result = result.replace(entity, replacement);
    }
    result
}
