pub mod etl;
pub mod fetch;
pub mod flatten;
pub mod pipeline;
pub mod query;
pub mod scroll;

pub use crate::domain::model::{FlatTable, Record, ResultPage, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, SearchBackend, Storage};
pub use crate::utils::error::Result;
