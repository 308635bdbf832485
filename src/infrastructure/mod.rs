// Infrastructure layer - External dependencies and adapters
pub mod backend_client;
pub mod backend_process;
pub mod config;
pub mod http_response;
