pub mod discovery;
pub mod etl;
pub mod pipeline;

pub use crate::domain::model::{LogFile, Record, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, QcModule, Storage};
pub use crate::utils::error::Result;
