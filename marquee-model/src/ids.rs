use crate::media_type::MediaType;

/// Identifier of a local user. Every relation row is scoped by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct UserId(pub i64);

impl UserId {
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Compound primary key of media summaries and details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MediaKey {
    pub id: i64,
    pub media_type: MediaType,
}

impl MediaKey {
    pub const fn new(id: i64, media_type: MediaType) -> Self {
        Self { id, media_type }
    }

    pub const fn movie(id: i64) -> Self {
        Self::new(id, MediaType::Movie)
    }

    pub const fn series(id: i64) -> Self {
        Self::new(id, MediaType::Series)
    }
}

impl std::fmt::Display for MediaKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.media_type.as_str(), self.id)
    }
}
