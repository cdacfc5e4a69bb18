use serde::{Deserialize, Serialize};

pub const DEFAULT_WIDTH: i32 = 1080;
pub const DEFAULT_HEIGHT: i32 = 1920;
pub const DEFAULT_QUALITY: i32 = 100;

const PARAM: &str = "tr=";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "16:9")]
    Widescreen,
    #[default]
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "4:3")]
    Standard,
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "21:9")]
    Ultrawide,
}

impl AspectRatio {
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "16:9" => Some(Self::Widescreen),
            "9:16" => Some(Self::Portrait),
            "4:3" => Some(Self::Standard),
            "1:1" => Some(Self::Square),
            "21:9" => Some(Self::Ultrawide),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Widescreen => "16:9",
            Self::Portrait => "9:16",
            Self::Standard => "4:3",
            Self::Square => "1:1",
            Self::Ultrawide => "21:9",
        }
    }

    pub fn ratio(&self) -> (u32, u32) {
        match self {
            Self::Widescreen => (16, 9),
            Self::Portrait => (9, 16),
            Self::Standard => (4, 3),
            Self::Square => (1, 1),
            Self::Ultrawide => (21, 9),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    None,
    Sepia,
    Grayscale,
    Blur,
}

impl Filter {
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "none" => Some(Self::None),
            "sepia" => Some(Self::Sepia),
            "grayscale" => Some(Self::Grayscale),
            "blur" => Some(Self::Blur),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Sepia => "sepia",
            Self::Grayscale => "grayscale",
            Self::Blur => "blur",
        }
    }

    fn token(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Sepia => Some("e-sepia"),
            Self::Grayscale => Some("e-grayscale"),
            Self::Blur => Some("bl-10"),
        }
    }
}

/// Rendering options stored alongside an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transformation {
    pub aspect_ratio: AspectRatio,
    pub width: i32,
    pub height: i32,
    pub quality: i32,
    pub filter: Filter,
}

impl Default for Transformation {
    fn default() -> Self {
        Self {
            aspect_ratio: AspectRatio::default(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            quality: DEFAULT_QUALITY,
            filter: Filter::None,
        }
    }
}

/// Rendering options stored alongside a video. Videos carry no filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoTransformation {
    pub aspect_ratio: AspectRatio,
    pub width: i32,
    pub height: i32,
    pub quality: i32,
}

impl Default for VideoTransformation {
    fn default() -> Self {
        Self {
            aspect_ratio: AspectRatio::default(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            quality: DEFAULT_QUALITY,
        }
    }
}

/// Partial transformation as sent by clients on create and update.
/// Absent fields keep their current (or default) value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformationInput {
    pub aspect_ratio: Option<AspectRatio>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub quality: Option<i32>,
    pub filter: Option<Filter>,
}

impl TransformationInput {
    pub fn validate(&self) -> Result<(), &'static str> {
        if let Some(quality) = self.quality {
            if !(1..=100).contains(&quality) {
                return Err("quality must be between 1 and 100");
            }
        }
        if matches!(self.width, Some(width) if width <= 0) {
            return Err("width must be greater than 0");
        }
        if matches!(self.height, Some(height) if height <= 0) {
            return Err("height must be greater than 0");
        }
        Ok(())
    }

    pub fn apply_to(&self, current: &Transformation) -> Transformation {
        Transformation {
            aspect_ratio: self.aspect_ratio.unwrap_or(current.aspect_ratio),
            width: self.width.unwrap_or(current.width),
            height: self.height.unwrap_or(current.height),
            quality: self.quality.unwrap_or(current.quality),
            filter: self.filter.unwrap_or(current.filter),
        }
    }

    pub fn apply_to_video(&self, current: &VideoTransformation) -> VideoTransformation {
        VideoTransformation {
            aspect_ratio: self.aspect_ratio.unwrap_or(current.aspect_ratio),
            width: self.width.unwrap_or(current.width),
            height: self.height.unwrap_or(current.height),
            quality: self.quality.unwrap_or(current.quality),
        }
    }
}

/// The fields of a transformation record that produce CDN tokens.
pub trait TransformSpec {
    fn aspect_ratio(&self) -> AspectRatio;
    fn quality(&self) -> i32;
    fn filter(&self) -> Filter {
        Filter::None
    }
}

impl TransformSpec for Transformation {
    fn aspect_ratio(&self) -> AspectRatio {
        self.aspect_ratio
    }

    fn quality(&self) -> i32 {
        self.quality
    }

    fn filter(&self) -> Filter {
        self.filter
    }
}

impl TransformSpec for VideoTransformation {
    fn aspect_ratio(&self) -> AspectRatio {
        self.aspect_ratio
    }

    fn quality(&self) -> i32 {
        self.quality
    }
}

/// Comma-joined CDN tokens for `spec`, empty when every field is at its
/// neutral value (16:9, quality 100, no filter).
pub fn transformation_tokens(spec: &impl TransformSpec) -> String {
    let mut tokens: Vec<String> = Vec::with_capacity(3);

    let aspect_ratio = spec.aspect_ratio();
    if aspect_ratio != AspectRatio::Widescreen {
        let (w, h) = aspect_ratio.ratio();
        tokens.push(format!("ar-{}-{},c-at_max", w, h));
    }

    let quality = spec.quality();
    if quality != DEFAULT_QUALITY {
        tokens.push(format!("q-{}", quality));
    }

    if let Some(token) = spec.filter().token() {
        tokens.push(token.to_string());
    }

    tokens.join(",")
}

pub fn has_transformation(url: &str) -> bool {
    marker_position(url).is_some()
}

/// Appends the `tr` query parameter for `spec` to `url`. A URL that already
/// carries one is returned untouched.
pub fn transformed_url(url: &str, spec: &impl TransformSpec) -> String {
    if has_transformation(url) {
        return url.to_string();
    }

    let tokens = transformation_tokens(spec);
    if tokens.is_empty() {
        return url.to_string();
    }

    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}{}{}", url, separator, PARAM, tokens)
}

/// Drops the `tr` parameter (and anything after it) from `url`.
pub fn strip_transformation(url: &str) -> &str {
    match marker_position(url) {
        Some(index) => &url[..index],
        None => url,
    }
}

fn marker_position(url: &str) -> Option<usize> {
    let query_start = url.find('?')?;
    let query = &url[query_start..];
    query
        .match_indices(PARAM)
        .map(|(offset, _)| query_start + offset)
        .find(|&index| index > 0 && matches!(url.as_bytes()[index - 1], b'?' | b'&'))
        .map(|index| index - 1)
}
