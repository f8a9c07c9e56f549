// Adapters layer: concrete implementations for external systems (storage, http, seed files).

pub mod http;
pub mod memory;
pub mod seed;
pub mod sqlite;
