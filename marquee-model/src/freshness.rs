/// Where an emitted value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Freshness {
    /// Just fetched from the remote source, or read from an authoritative
    /// local relation table.
    Fresh,
    /// Read from the local cache and still within its TTL, or a cached list
    /// whose refresh has not completed (yet).
    Cached,
    /// Read from the local cache past its TTL.
    Stale,
}

/// A successfully produced value together with its [`Freshness`].
///
/// Degraded results are not errors: callers decide whether to surface an
/// offline or staleness banner from the flag.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub value: T,
    pub freshness: Freshness,
}

impl<T> Fetched<T> {
    pub fn fresh(value: T) -> Self {
        Self {
            value,
            freshness: Freshness::Fresh,
        }
    }

    pub fn cached(value: T) -> Self {
        Self {
            value,
            freshness: Freshness::Cached,
        }
    }

    pub fn stale(value: T) -> Self {
        Self {
            value,
            freshness: Freshness::Stale,
        }
    }

    pub fn is_fresh(&self) -> bool {
        self.freshness == Freshness::Fresh
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        Fetched {
            value: f(self.value),
            freshness: self.freshness,
        }
    }
}
