use std::fmt::{Display, Formatter};

/// Poster widths offered by the upstream image CDN (2:3 aspect ratio).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PosterSize {
    W92,
    W154,
    W185,
    W342,
    #[default]
    W500,
    W780,
    Original,
}

impl PosterSize {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PosterSize::W92 => "w92",
            PosterSize::W154 => "w154",
            PosterSize::W185 => "w185",
            PosterSize::W342 => "w342",
            PosterSize::W500 => "w500",
            PosterSize::W780 => "w780",
            PosterSize::Original => "original",
        }
    }
}

/// Backdrop widths (16:9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BackdropSize {
    W300,
    #[default]
    W780,
    W1280,
    Original,
}

impl BackdropSize {
    pub const fn as_str(&self) -> &'static str {
        match self {
            BackdropSize::W300 => "w300",
            BackdropSize::W780 => "w780",
            BackdropSize::W1280 => "w1280",
            BackdropSize::Original => "original",
        }
    }
}

/// Episode still widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum StillSize {
    W92,
    W185,
    #[default]
    W300,
    Original,
}

impl StillSize {
    pub const fn as_str(&self) -> &'static str {
        match self {
            StillSize::W92 => "w92",
            StillSize::W185 => "w185",
            StillSize::W300 => "w300",
            StillSize::Original => "original",
        }
    }
}

/// Completes relative image paths from the content API into absolute URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBase {
    base_url: String,
    pub poster: PosterSize,
    pub backdrop: BackdropSize,
    pub still: StillSize,
}

impl ImageBase {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            poster: PosterSize::default(),
            backdrop: BackdropSize::default(),
            still: StillSize::default(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn poster_url(&self, path: Option<&str>) -> Option<String> {
        self.complete(self.poster.as_str(), path)
    }

    pub fn backdrop_url(&self, path: Option<&str>) -> Option<String> {
        self.complete(self.backdrop.as_str(), path)
    }

    pub fn still_url(&self, path: Option<&str>) -> Option<String> {
        self.complete(self.still.as_str(), path)
    }

    fn complete(&self, size: &str, path: Option<&str>) -> Option<String> {
        let path = path.map(str::trim).filter(|p| !p.is_empty())?;
        if path.starts_with("http://") || path.starts_with("https://") {
            return Some(path.to_string());
        }
        let path = path.trim_start_matches('/');
        Some(format!("{}/{}/{}", self.base_url, size, path))
    }
}

impl Display for ImageBase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (poster {}, backdrop {})",
            self.base_url,
            self.poster.as_str(),
            self.backdrop.as_str()
        )
    }
}
