pub mod admission;
pub mod cache;
pub mod sweep;

pub use admission::{AdmissionController, AdmissionStats, Decision, MemoryRateStore, RateStore};
pub use cache::{CacheStats, CacheStore, MemoryCacheStore, ResponseCache};
pub use sweep::Sweeper;
