pub mod codec;
pub mod observe;
pub mod ports;
mod rows;
pub mod sqlite;

pub use observe::{Subscription, observe, observe_media};
pub use ports::{DetailStamp, LocalStore, StoreChange};
pub use sqlite::SqliteLocalStore;
