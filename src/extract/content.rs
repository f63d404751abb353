use super::{attr_or_empty, element_text, selector, ExtractResult, Extractor, PageInput};
use crate::store::{BodyBlock, ContentEntry, PageRecord};
use scraper::{ElementRef, Selector};

const SUMMARY_CHARS: usize = 200;

/// Primary heading, breadcrumbs, publication metadata and the body as a
/// sequence of blocks in document order
pub struct ContentExtractor {
    h1: Selector,
    breadcrumbs: Selector,
    published: Selector,
    author: Selector,
    tags: Selector,
    paragraph: Selector,
    blocks: Selector,
    list_items: Selector,
}

impl ContentExtractor {
    pub fn new() -> ExtractResult<Self> {
        Ok(Self {
            h1: selector("h1")?,
            breadcrumbs: selector(r#"nav[class*="breadcrumb"] a"#)?,
            published: selector("time[datetime]")?,
            author: selector(r#"meta[name="author"]"#)?,
            tags: selector(r#"meta[property="article:tag"]"#)?,
            paragraph: selector("p")?,
            blocks: selector("p, h1, h2, h3, h4, h5, h6, img, ul, ol")?,
            list_items: selector("li")?,
        })
    }

    fn block(&self, element: ElementRef<'_>) -> Option<BodyBlock> {
        let tag = element.value().name();
        match tag {
            "p" => non_empty(element_text(&element)).map(|text| BodyBlock::Paragraph { text }),
            "img" => {
                let src = attr_or_empty(&element, "src");
                if src.is_empty() {
                    return None;
                }
                Some(BodyBlock::Image {
                    src,
                    alt: attr_or_empty(&element, "alt"),
                })
            }
            "ul" | "ol" => {
                let items: Vec<String> = element
                    .select(&self.list_items)
                    .filter_map(|li| non_empty(element_text(&li)))
                    .collect();
                if items.is_empty() {
                    return None;
                }
                Some(BodyBlock::List {
                    ordered: tag == "ol",
                    items,
                })
            }
            _ => {
                let level = tag.strip_prefix('h')?.parse::<u8>().ok()?;
                non_empty(element_text(&element)).map(|text| BodyBlock::Heading { level, text })
            }
        }
    }
}

impl Extractor for ContentExtractor {
    fn name(&self) -> &'static str {
        "content"
    }

    fn extract(&self, page: &PageInput<'_>) -> ExtractResult<Vec<PageRecord>> {
        let doc = page.document;

        let h1 = doc
            .select(&self.h1)
            .next()
            .map(|h| element_text(&h))
            .unwrap_or_default();

        let breadcrumbs = doc
            .select(&self.breadcrumbs)
            .map(|a| element_text(&a))
            .collect();

        let date_published = doc
            .select(&self.published)
            .find_map(|t| t.value().attr("datetime"))
            .map(|d| d.trim().to_string());

        let author = doc
            .select(&self.author)
            .find_map(|m| m.value().attr("content"))
            .and_then(|a| non_empty(a.trim().to_string()));

        let tags = doc
            .select(&self.tags)
            .filter_map(|m| m.value().attr("content"))
            .filter_map(|t| non_empty(t.trim().to_string()))
            .collect();

        let summary = doc
            .select(&self.paragraph)
            .next()
            .map(|p| element_text(&p).chars().take(SUMMARY_CHARS).collect())
            .unwrap_or_default();

        let body_blocks = doc
            .select(&self.blocks)
            .filter_map(|el| self.block(el))
            .collect();

        Ok(vec![PageRecord::Content(ContentEntry {
            url: page.url.to_string(),
            h1,
            breadcrumbs,
            date_published,
            author,
            tags,
            summary,
            body_blocks,
        })])
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
