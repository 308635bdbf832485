// Application layer - Use cases over the domain
pub mod csv_ingestion;
pub mod extremum_service;
pub mod log_service;
pub mod plot_service;
pub mod vehicle_repository;
