pub mod sse;
pub mod streamable;

pub use sse::{SessionGuard, SessionHandle, SessionTable, MESSAGES_PATH};
pub use streamable::StreamableTransport;
