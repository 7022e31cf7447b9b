/// Episode identity independent of any cached season payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EpisodeKey {
    pub series_id: i64,
    pub season_number: u16,
    pub episode_number: u16,
}

impl EpisodeKey {
    pub const fn new(
        series_id: i64,
        season_number: u16,
        episode_number: u16,
    ) -> Self {
        Self {
            series_id,
            season_number,
            episode_number,
        }
    }
}
