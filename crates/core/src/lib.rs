pub mod bear;
pub mod cache;
pub mod config;
pub mod error;
pub mod instance;
pub mod params;
pub mod result;
pub mod section;

pub use bear::{fails, yields, AnalysisInput, Bear, BearSpec, Granularity, ResultStream};
pub use cache::{CacheKey, MemoryCache, ResultCache};
pub use config::{EngineConfig, ExecutorKind};
pub use error::*;
pub use instance::BearInstance;
pub use params::{BoundParams, ParamKind, ParamSpec, ParamValue};
pub use result::{split_lines, FileSet, ResultItem};
pub use section::Section;
