use crate::store::PageType;
use url::Url;

/// Path fragments checked in order; the first match decides the type
const PATH_RULES: &[(&str, PageType)] = &[
    ("/news", PageType::Listing),
    ("/events", PageType::Event),
    ("/faculty", PageType::Faculty),
    ("/faculties", PageType::Faculty),
    ("/department", PageType::Department),
    ("/academics", PageType::Page),
    ("/about", PageType::Page),
    ("/admissions", PageType::Page),
    ("/research", PageType::Page),
    ("/contacts", PageType::Contact),
    ("/career", PageType::Page),
    ("/centers", PageType::Page),
    ("/library", PageType::Page),
];

/// Derives the page type from the URL path, falling back to the content
///
/// The home page is the language prefix itself, with or without the
/// trailing slash. When no path rule matches, pages carrying an
/// `<article>` element or an `Article` JSON-LD type are articles.
pub fn classify_page(url: &Url, html: &str, language_prefix: &str) -> PageType {
    let path = url.path();

    if path == language_prefix || path == language_prefix.trim_end_matches('/') {
        return PageType::Home;
    }

    if let Some((_, page_type)) = PATH_RULES.iter().find(|(needle, _)| path.contains(needle)) {
        return *page_type;
    }

    if looks_like_article(html) {
        PageType::Article
    } else {
        PageType::Page
    }
}

fn looks_like_article(html: &str) -> bool {
    if html.contains("<article") {
        return true;
    }
    let compact: String = html
        .split("@type")
        .skip(1)
        .flat_map(|rest| rest.chars().take(24))
        .filter(|c| !c.is_whitespace())
        .collect();
    compact.contains(":\"Article\"")
}
