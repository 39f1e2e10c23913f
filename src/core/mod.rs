pub mod decoder;
pub mod export;
pub mod fetcher;
pub mod loader;
pub mod session;

pub use crate::domain::model::{ColumnGroup, FetchResponse, FieldSchema, FieldSpec, Record};
pub use crate::domain::ports::{ConfigProvider, RetrievalStrategy};
pub use crate::utils::error::Result;
