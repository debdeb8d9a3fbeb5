//! Configuration: built-in scan profiles, the port policy they select, and
//! XDG-compliant application settings.

mod policy;
mod settings;

pub use policy::{PortPolicy, ScanProfile};
pub use settings::{AppSettings, Paths};
