pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::ElasticsearchBackend;
pub use config::{cli::LocalStorage, toml_config::TomlConfig};
pub use self::core::{
    etl::EtlEngine,
    fetch::{fetch_applications, residential_units_query, social_rent_units_query},
    pipeline::ApplicationsPipeline,
    query::{build_query, FilterParameters, QueryDocument, Variant},
    scroll::{fetch_all, ScrollPages, ScrollSettings},
};
pub use domain::model::{FlatTable, Record, ResultPage};
pub use domain::ports::SearchBackend;
pub use utils::error::{EtlError, Result};
