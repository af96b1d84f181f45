pub mod kv;
pub mod schema_cache;
pub mod single_flight;

pub use kv::{InMemoryKvStore, KeyValueStore};
pub use schema_cache::{DEFAULT_CACHE_CAPACITY, RuntimeSchema, SchemaCache};
pub use single_flight::SingleFlight;
