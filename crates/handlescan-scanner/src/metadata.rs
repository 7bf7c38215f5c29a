//! Profile preview extraction from HTML.

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use url::Url;

/// Descriptions longer than this are truncated.
pub const MAX_DESCRIPTION_CHARS: usize = 300;

const ELLIPSIS: &str = "...";

/// Optional preview data scraped from a profile page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileMetadata {
    /// Preview image URL
    pub image: Option<String>,
    /// Short description, at most [`MAX_DESCRIPTION_CHARS`] characters
    pub description: Option<String>,
}

impl ProfileMetadata {
    /// True when neither field was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.image.is_none() && self.description.is_none()
    }
}

struct Selectors {
    og_image: Selector,
    twitter_image: Selector,
    meta_description: Selector,
    og_description: Selector,
    twitter_description: Selector,
    title: Selector,
}

fn selectors() -> &'static Selectors {
    static SELECTORS: OnceLock<Selectors> = OnceLock::new();
    SELECTORS.get_or_init(|| Selectors {
        og_image: Selector::parse(r#"meta[property="og:image"]"#).expect("valid selector"),
        twitter_image: Selector::parse(
            r#"meta[name="twitter:image"], meta[property="twitter:image"]"#,
        )
        .expect("valid selector"),
        meta_description: Selector::parse(r#"meta[name="description"]"#).expect("valid selector"),
        og_description: Selector::parse(r#"meta[property="og:description"]"#)
            .expect("valid selector"),
        twitter_description: Selector::parse(r#"meta[name="twitter:description"]"#)
            .expect("valid selector"),
        title: Selector::parse("title").expect("valid selector"),
    })
}

/// Extract preview metadata from a page body.
///
/// Never fails: malformed or non-HTML input yields empty metadata.
#[must_use]
pub fn extract(html: &str) -> ProfileMetadata {
    let document = Html::parse_document(html);
    let sel = selectors();

    let image = meta_content(&document, &sel.og_image)
        .or_else(|| meta_content(&document, &sel.twitter_image));

    let description = meta_content(&document, &sel.meta_description)
        .or_else(|| meta_content(&document, &sel.og_description))
        .or_else(|| meta_content(&document, &sel.twitter_description))
        .or_else(|| title_text(&document, &sel.title))
        .map(|text| truncate(&text));

    ProfileMetadata { image, description }
}

/// Like [`extract`], resolving a relative image URL against `base_url`.
///
/// The image is kept as written when either URL fails to parse.
#[must_use]
pub fn extract_with_base(html: &str, base_url: &str) -> ProfileMetadata {
    let mut metadata = extract(html);
    if let Some(image) = metadata.image.take() {
        let resolved = Url::parse(base_url)
            .and_then(|base| base.join(&image))
            .map_or(image, String::from);
        metadata.image = Some(resolved);
    }
    metadata
}

fn meta_content(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .filter_map(|element| element.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty())
        .map(str::to_string)
}

fn title_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .map(|element| {
            element
                .text()
                .flat_map(str::split_whitespace)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .find(|text| !text.is_empty())
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_DESCRIPTION_CHARS {
        return text.to_string();
    }
    let keep = MAX_DESCRIPTION_CHARS - ELLIPSIS.len();
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}
