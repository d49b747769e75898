pub mod memory;
pub mod redis;
pub mod store;

pub use memory::MemoryStore;
pub use self::redis::RedisStore;
pub use store::{KvStore, StoreKey};
