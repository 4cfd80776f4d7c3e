pub mod context;
pub mod logging;

pub use context::{context_middleware, ContextState, RequestContextExt};
pub use logging::logging_middleware;
