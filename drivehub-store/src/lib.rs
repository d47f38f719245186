pub mod app_config;
pub mod database;
pub mod documents;
pub mod events;
pub mod memory;
pub mod postgres;

pub use database::DbClient;
pub use documents::LocalDocumentStore;
pub use events::{BroadcastNotifier, EventProducer};
pub use memory::InMemoryStore;
pub use postgres::PgStore;
