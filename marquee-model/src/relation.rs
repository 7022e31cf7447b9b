use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::ModelError;
use crate::ids::{MediaKey, UserId};

/// The two user-curated relation sets. Both share the same shape and keying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RelationKind {
    Favorite,
    Watched,
}

impl RelationKind {
    pub const ALL: [RelationKind; 2] =
        [RelationKind::Favorite, RelationKind::Watched];

    /// Backing table in the local schema.
    pub const fn table(&self) -> &'static str {
        match self {
            RelationKind::Favorite => "favorites",
            RelationKind::Watched => "watched",
        }
    }
}

impl Display for RelationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RelationKind::Favorite => write!(f, "favorite"),
            RelationKind::Watched => write!(f, "watched"),
        }
    }
}

impl FromStr for RelationKind {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "favorite" | "favorites" => Ok(RelationKind::Favorite),
            "watched" => Ok(RelationKind::Watched),
            other => Err(ModelError::UnknownRelationKind(other.to_string())),
        }
    }
}

/// One membership row, keyed by the full (user, media id, media type) triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RelationRecord {
    pub user_id: UserId,
    pub media: MediaKey,
}

impl RelationRecord {
    pub const fn new(user_id: UserId, media: MediaKey) -> Self {
        Self { user_id, media }
    }
}

/// Outcome of a relation mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationWrite {
    Applied,
    /// No signed-in user; the mutation was skipped without error.
    Ignored,
}

impl RelationWrite {
    pub fn is_applied(&self) -> bool {
        matches!(self, RelationWrite::Applied)
    }
}
