use serde::{Deserialize, Serialize};

/// Reference to a preview image the surface can display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ImageRef {
    Remote(String),
    /// A `data:` URL.
    Inline(String),
}

impl ImageRef {
    pub fn as_str(&self) -> &str {
        match self {
            ImageRef::Remote(url) | ImageRef::Inline(url) => url,
        }
    }
}

/// Which strategy of the resolver chain produced an image.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PreviewSource {
    SiteOverride,
    MetaTag,
    LinkHint,
    VideoPoster,
    HeroBackground,
    LargestImage,
    Placeholder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreviewImage {
    pub source: PreviewSource,
    pub image: ImageRef,
}

/// Why no preview could be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableReason {
    UnsupportedScheme,
    ExecutionFailed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PreviewResult {
    Image(PreviewImage),
    Unavailable(UnavailableReason),
}

// === Document snapshot ===
//
// Data collected by the probe that runs in the tab's main world. The host
// serialises it as JSON; the strategy chain then runs in-process over it.

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MetaTag {
    #[serde(default)]
    pub property: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct LinkTag {
    pub rel: String,
    pub href: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct VideoElement {
    #[serde(default)]
    pub poster: Option<String>,
    pub width: f64,
    pub height: f64,
}

/// An element with its computed `background-image` and client size.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StyledElement {
    #[serde(default)]
    pub class_name: String,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub background_image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ImageElement {
    pub src: String,
    pub natural_width: u32,
    pub natural_height: u32,
    #[serde(default = "default_true")]
    pub complete: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DocumentSnapshot {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub meta: Vec<MetaTag>,
    #[serde(default)]
    pub links: Vec<LinkTag>,
    #[serde(default)]
    pub videos: Vec<VideoElement>,
    #[serde(default)]
    pub elements: Vec<StyledElement>,
    #[serde(default)]
    pub images: Vec<ImageElement>,
}
