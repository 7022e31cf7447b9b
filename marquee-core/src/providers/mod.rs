pub mod genres;
pub mod remote;
pub mod tmdb;
mod wire;

pub use genres::{genre_name, resolve_genres};
#[cfg(test)]
pub use remote::MockRemoteSource;
pub use remote::RemoteSource;
pub use tmdb::TmdbRemoteSource;
