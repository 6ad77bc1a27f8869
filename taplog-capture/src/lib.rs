pub mod builder;
pub mod context;
pub mod logger;

pub use builder::EntryBuilder;
pub use context::{RequestContext, ResponseOutcome};
pub use logger::{BusRequestLogger, RequestLogger};
