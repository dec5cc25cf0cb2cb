// Adapters layer: concrete implementations for external systems.

pub mod elasticsearch;

pub use elasticsearch::ElasticsearchBackend;
