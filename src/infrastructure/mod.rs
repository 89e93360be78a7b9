// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod http_response;
pub mod json_file_storage;
pub mod memory_storage;
pub mod tfl_client;
