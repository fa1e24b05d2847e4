pub mod events;
pub mod repo;
pub mod source;
