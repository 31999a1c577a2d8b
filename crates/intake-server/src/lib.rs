pub mod config;
pub mod error;
pub mod error_log;
pub mod handlers;
pub mod intake;
pub mod middleware;
pub mod observability;
pub mod realtime;
pub mod server;
pub mod storage;

pub use config::{AppConfig, ConfigError, StorageBackend};
pub use error::ApiError;
pub use error_log::{ErrorLog, FailureRecord, FileErrorLog};
pub use intake::IntakeService;
pub use observability::init_tracing;
pub use realtime::{BroadcastHub, ConnectionRegistry, FanoutReport, OverflowPolicy};
pub use server::{AppState, IntakeServer, ServerBuilder, build_app, router};
