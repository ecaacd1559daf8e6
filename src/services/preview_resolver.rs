//! Preview Resolver.
//!
//! Finds a representative image for a tab. The probe runs in the tab's main
//! world and returns a [`DocumentSnapshot`]; the ordered strategy chain below
//! then runs in-process over a [`DomQuery`] view of it. First match wins, and
//! a synthesized placeholder closes the chain so a resolved document always
//! yields an image.

use tracing::debug;
use url::Url;

use crate::platform::host::ScriptHost;
use crate::services::placeholder;
use crate::types::preview::{
    DocumentSnapshot, ImageElement, ImageRef, PreviewImage, PreviewResult, PreviewSource,
    StyledElement, UnavailableReason, VideoElement,
};
use crate::types::tab::{hostname_of, is_capturable_url, TabRecord};

/// Meta tags carrying a social preview image, in priority order.
pub const META_IMAGE_TAGS: [(MetaAttribute, &str); 4] = [
    (MetaAttribute::Property, "og:image"),
    (MetaAttribute::Property, "og:image:secure_url"),
    (MetaAttribute::Name, "twitter:image"),
    (MetaAttribute::Name, "twitter:image:src"),
];

/// `<link rel>` values that point at a preview image, in priority order.
pub const LINK_IMAGE_RELS: [&str; 2] = ["image_src", "apple-touch-icon"];

/// Class-name fragments that mark hero-like elements.
pub const HERO_CLASS_HINTS: [&str; 7] = [
    "hero",
    "banner",
    "cover",
    "masthead",
    "jumbotron",
    "featured",
    "splash",
];

pub const MIN_BACKGROUND_WIDTH: f64 = 200.0;
pub const MIN_BACKGROUND_HEIGHT: f64 = 150.0;
pub const MIN_IMAGE_WIDTH: u32 = 300;
pub const MIN_IMAGE_HEIGHT: u32 = 150;
pub const MIN_IMAGE_ASPECT: f64 = 0.5;
pub const MAX_IMAGE_ASPECT: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaAttribute {
    Property,
    Name,
}

/// Read-only queries the strategies need from a document.
pub trait DomQuery {
    fn page_url(&self) -> &str;
    fn title(&self) -> &str;
    fn meta_content(&self, attribute: MetaAttribute, key: &str) -> Option<&str>;
    fn link_href(&self, rel: &str) -> Option<&str>;
    fn videos(&self) -> &[VideoElement];
    fn elements(&self) -> &[StyledElement];
    fn images(&self) -> &[ImageElement];
}

impl DomQuery for DocumentSnapshot {
    fn page_url(&self) -> &str {
        &self.url
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn meta_content(&self, attribute: MetaAttribute, key: &str) -> Option<&str> {
        self.meta
            .iter()
            .filter(|m| {
                let attr = match attribute {
                    MetaAttribute::Property => m.property.as_deref(),
                    MetaAttribute::Name => m.name.as_deref(),
                };
                attr.is_some_and(|a| a.eq_ignore_ascii_case(key))
            })
            .filter_map(|m| m.content.as_deref())
            .map(str::trim)
            .find(|c| !c.is_empty())
    }

    fn link_href(&self, rel: &str) -> Option<&str> {
        self.links
            .iter()
            .filter(|l| {
                l.rel
                    .split_ascii_whitespace()
                    .any(|token| token.eq_ignore_ascii_case(rel))
            })
            .map(|l| l.href.trim())
            .find(|h| !h.is_empty())
    }

    fn videos(&self) -> &[VideoElement] {
        &self.videos
    }

    fn elements(&self) -> &[StyledElement] {
        &self.elements
    }

    fn images(&self) -> &[ImageElement] {
        &self.images
    }
}

/// One link of the chain. Matchers return the raw (possibly relative) URL.
#[derive(Clone, Copy)]
pub struct Strategy {
    pub name: &'static str,
    pub source: PreviewSource,
    pub matcher: fn(&dyn DomQuery) -> Option<String>,
}

impl std::fmt::Debug for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Strategy")
            .field("name", &self.name)
            .field("source", &self.source)
            .finish()
    }
}

/// Cheapest and most likely useful signals first.
pub fn default_strategies() -> Vec<Strategy> {
    vec![
        Strategy {
            name: "site-override",
            source: PreviewSource::SiteOverride,
            matcher: site_override,
        },
        Strategy {
            name: "meta-image",
            source: PreviewSource::MetaTag,
            matcher: meta_image,
        },
        Strategy {
            name: "link-hint",
            source: PreviewSource::LinkHint,
            matcher: link_hint,
        },
        Strategy {
            name: "video-poster",
            source: PreviewSource::VideoPoster,
            matcher: video_poster,
        },
        Strategy {
            name: "hero-background",
            source: PreviewSource::HeroBackground,
            matcher: hero_background,
        },
        Strategy {
            name: "largest-image",
            source: PreviewSource::LargestImage,
            matcher: largest_image,
        },
    ]
}

// === Matchers ===

/// Video hosting: derive the thumbnail from the page URL alone.
pub fn site_override(dom: &dyn DomQuery) -> Option<String> {
    youtube_video_id(dom.page_url())
        .map(|id| format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", id))
}

fn youtube_video_id(page_url: &str) -> Option<String> {
    let url = Url::parse(page_url).ok()?;
    let host = url.host_str()?.trim_start_matches("www.").trim_start_matches("m.");
    let id = if host == "youtu.be" {
        url.path_segments()?.next().map(str::to_string)
    } else if host == "youtube.com" || host.ends_with(".youtube.com") {
        if url.path() == "/watch" {
            url.query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.into_owned())
        } else {
            let mut segments = url.path_segments()?;
            match (segments.next(), segments.next()) {
                (Some("shorts"), Some(id)) => Some(id.to_string()),
                _ => None,
            }
        }
    } else {
        None
    };
    id.filter(|id| {
        !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    })
}

pub fn meta_image(dom: &dyn DomQuery) -> Option<String> {
    META_IMAGE_TAGS
        .iter()
        .find_map(|(attr, key)| dom.meta_content(*attr, key))
        .map(str::to_string)
}

pub fn link_hint(dom: &dyn DomQuery) -> Option<String> {
    LINK_IMAGE_RELS
        .iter()
        .find_map(|rel| dom.link_href(rel))
        .map(str::to_string)
}

/// Poster of the largest video that has one.
pub fn video_poster(dom: &dyn DomQuery) -> Option<String> {
    let mut best: Option<(&VideoElement, &str)> = None;
    for video in dom.videos() {
        let Some(poster) = video.poster.as_deref().map(str::trim).filter(|p| !p.is_empty()) else {
            continue;
        };
        let area = video.width * video.height;
        match best {
            Some((b, _)) if b.width * b.height >= area => {}
            _ => best = Some((video, poster)),
        }
    }
    best.map(|(_, poster)| poster.to_string())
}

/// Background image of the largest hero-marked element, else of the largest
/// qualifying element of any kind. Icon-sized elements never qualify.
pub fn hero_background(dom: &dyn DomQuery) -> Option<String> {
    let qualifying: Vec<(&StyledElement, String)> = dom
        .elements()
        .iter()
        .filter(|el| el.width >= MIN_BACKGROUND_WIDTH && el.height >= MIN_BACKGROUND_HEIGHT)
        .filter_map(|el| {
            el.background_image
                .as_deref()
                .and_then(css_url)
                .map(|url| (el, url))
        })
        .collect();

    let largest = |candidates: Vec<&(&StyledElement, String)>| {
        candidates
            .into_iter()
            .fold(None::<&(&StyledElement, String)>, |best, cur| match best {
                Some(b) if b.0.width * b.0.height >= cur.0.width * cur.0.height => Some(b),
                _ => Some(cur),
            })
            .map(|(_, url)| url.clone())
    };

    let heroes: Vec<_> = qualifying.iter().filter(|(el, _)| is_hero(el)).collect();
    largest(heroes).or_else(|| largest(qualifying.iter().collect()))
}

fn is_hero(el: &StyledElement) -> bool {
    let classes = el.class_name.to_ascii_lowercase();
    HERO_CLASS_HINTS.iter().any(|hint| classes.contains(hint))
}

/// First `url(...)` inside a computed `background-image` value.
pub fn css_url(value: &str) -> Option<String> {
    let start = value.find("url(")? + 4;
    let rest = &value[start..];
    let end = rest.find(')')?;
    let inner = rest[..end].trim().trim_matches(|c| c == '"' || c == '\'').trim();
    if inner.is_empty() {
        None
    } else {
        Some(inner.to_string())
    }
}

/// Largest loaded image within the size and aspect bounds; ties keep document order.
pub fn largest_image(dom: &dyn DomQuery) -> Option<String> {
    let mut best: Option<(&ImageElement, u64)> = None;
    for img in dom.images() {
        if !img.complete || img.src.trim().is_empty() {
            continue;
        }
        if img.natural_width < MIN_IMAGE_WIDTH || img.natural_height < MIN_IMAGE_HEIGHT {
            continue;
        }
        let aspect = img.natural_width as f64 / img.natural_height as f64;
        if !(MIN_IMAGE_ASPECT..=MAX_IMAGE_ASPECT).contains(&aspect) {
            continue;
        }
        let area = img.natural_width as u64 * img.natural_height as u64;
        if best.map_or(true, |(_, best_area)| area > best_area) {
            best = Some((img, area));
        }
    }
    best.map(|(img, _)| img.src.trim().to_string())
}

// === Resolver ===

/// Ordered strategy chain plus the tab-level entry point.
#[derive(Debug, Clone)]
pub struct PreviewResolver {
    strategies: Vec<Strategy>,
}

impl PreviewResolver {
    pub fn new() -> Self {
        Self {
            strategies: default_strategies(),
        }
    }

    pub fn with_strategies(strategies: Vec<Strategy>) -> Self {
        Self { strategies }
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    /// Runs the chain over a document; falls back to a placeholder.
    pub fn resolve_document(&self, dom: &dyn DomQuery) -> PreviewImage {
        for strategy in &self.strategies {
            let Some(raw) = (strategy.matcher)(dom) else {
                continue;
            };
            match absolutize(dom.page_url(), &raw) {
                Some(url) => {
                    debug!(strategy = strategy.name, url = %url, "preview found");
                    return PreviewImage {
                        source: strategy.source,
                        image: image_ref(url),
                    };
                }
                None => debug!(strategy = strategy.name, raw = %raw, "preview url rejected"),
            }
        }

        let hostname = hostname_of(dom.page_url());
        let title = if dom.title().trim().is_empty() {
            hostname.as_str()
        } else {
            dom.title()
        };
        PreviewImage {
            source: PreviewSource::Placeholder,
            image: placeholder::synthesize(title, &hostname),
        }
    }

    /// Resolves a preview for `tab`. Never errors: failures become
    /// [`PreviewResult::Unavailable`] and the caller keeps its own placeholder.
    pub async fn resolve_tab(&self, host: &dyn ScriptHost, tab: &TabRecord) -> PreviewResult {
        if !is_capturable_url(&tab.url) {
            return PreviewResult::Unavailable(UnavailableReason::UnsupportedScheme);
        }
        match host.snapshot_document(tab.id).await {
            Ok(snapshot) => PreviewResult::Image(self.resolve_document(&snapshot)),
            Err(e) => {
                debug!(tab_id = tab.id, error = %e, "preview probe failed");
                PreviewResult::Unavailable(UnavailableReason::ExecutionFailed)
            }
        }
    }
}

impl Default for PreviewResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves `raw` against the page URL; only web and data URLs are kept.
fn absolutize(page_url: &str, raw: &str) -> Option<String> {
    let parsed = match Url::parse(raw) {
        Ok(u) => u,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(page_url).ok()?.join(raw).ok()?,
        Err(_) => return None,
    };
    match parsed.scheme() {
        "http" | "https" | "data" => Some(parsed.to_string()),
        _ => None,
    }
}

fn image_ref(url: String) -> ImageRef {
    if url.starts_with("data:") {
        ImageRef::Inline(url)
    } else {
        ImageRef::Remote(url)
    }
}
