//! Core type definitions using newtype patterns for type safety.

mod port;
mod session_id;
mod target;

pub use port::{Port, PortError, PortRange, PortSpec};
pub use session_id::{SessionId, SessionIdError};
pub use target::{TargetError, TargetSpec, MAX_HOSTS};
