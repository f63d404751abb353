use super::{attr_or_empty, resolve, selector, ExtractResult, Extractor, PageInput};
use crate::store::{MediaEntry, MediaKind, PageRecord};
use scraper::{ElementRef, Selector};

/// Images, video and audio referenced by the page, including `<source>`
/// children of media elements
pub struct MediaExtractor {
    images: Selector,
    players: Selector,
    sources: Selector,
}

impl MediaExtractor {
    pub fn new() -> ExtractResult<Self> {
        Ok(Self {
            images: selector("img[src]")?,
            players: selector("video, audio")?,
            sources: selector("source[src]")?,
        })
    }
}

impl Extractor for MediaExtractor {
    fn name(&self) -> &'static str {
        "media"
    }

    fn extract(&self, page: &PageInput<'_>) -> ExtractResult<Vec<PageRecord>> {
        let page_url = page.url.to_string();
        let mut entries = Vec::new();

        for img in page.document.select(&self.images) {
            let src = attr_or_empty(&img, "src");
            if src.is_empty() {
                continue;
            }
            entries.push(MediaEntry {
                url: resolve(page.url, &src),
                page_url: page_url.clone(),
                alt: attr_or_empty(&img, "alt"),
                width: attr_or_empty(&img, "width"),
                height: attr_or_empty(&img, "height"),
                kind: MediaKind::Image,
                loading_attr: attr_or_empty(&img, "loading"),
                srcset_count: srcset_count(&img),
            });
        }

        for player in page.document.select(&self.players) {
            let kind = if player.value().name() == "video" {
                MediaKind::Video
            } else {
                MediaKind::Audio
            };

            let own_src = attr_or_empty(&player, "src");
            if !own_src.is_empty() {
                entries.push(MediaEntry {
                    url: resolve(page.url, &own_src),
                    page_url: page_url.clone(),
                    alt: String::new(),
                    width: attr_or_empty(&player, "width"),
                    height: attr_or_empty(&player, "height"),
                    kind,
                    loading_attr: String::new(),
                    srcset_count: 0,
                });
            }

            for source in player.select(&self.sources) {
                let src = attr_or_empty(&source, "src");
                if src.is_empty() {
                    continue;
                }
                entries.push(MediaEntry {
                    url: resolve(page.url, &src),
                    page_url: page_url.clone(),
                    alt: String::new(),
                    width: String::new(),
                    height: String::new(),
                    kind,
                    loading_attr: String::new(),
                    srcset_count: 0,
                });
            }
        }

        Ok(entries.into_iter().map(PageRecord::Media).collect())
    }
}

/// Number of candidates in a responsive `srcset` attribute
fn srcset_count(img: &ElementRef<'_>) -> usize {
    img.value()
        .attr("srcset")
        .map(|s| s.split(',').filter(|c| !c.trim().is_empty()).count())
        .unwrap_or(0)
}
