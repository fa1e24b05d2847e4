pub mod catalog_service;
pub mod ingest_service;
pub mod read_service;
