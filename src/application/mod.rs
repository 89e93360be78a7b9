// Application layer - Use cases and the ports they depend on
pub mod annotation_service;
pub mod annotation_storage;
pub mod clock;
pub mod filter_cache;
pub mod history_storage;
pub mod history_store;
pub mod lifecycle;
pub mod normalizer;
pub mod station_history_service;
pub mod station_provider;
