pub mod cache_state;
pub mod error;
pub mod logging;
pub mod normalization;
pub mod operation;
pub mod persisted_operations;
pub mod pipeline;
pub mod planner;
pub mod printer;
pub mod request;
pub mod schema;
pub mod variables;
pub mod warmup;
pub mod workspace;

pub use error::{ErrorKind, GraphQLError, OperationError};
pub use operation::{ClientInfo, FileUpload, OperationKind, ParsedOperation};
pub use pipeline::OperationProcessor;
pub use schema::SchemaIndex;
pub use warmup::{CacheWarmup, WarmupError, WarmupItem, WarmupStats};
