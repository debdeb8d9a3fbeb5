//! Session and bookmark persistence.
//!
//! The scan engine writes through the [`SessionStore`] contract. Two stores
//! implement it: [`JsonSessionStore`] keeps one JSON file per session and
//! backs the history commands, [`MemorySessionStore`] lives only as long as
//! the process.

mod bookmarks;
mod json_store;
mod memory;
mod session;

pub use bookmarks::{Bookmark, BookmarkStore, BookmarkUpdate};
pub use json_store::JsonSessionStore;
pub use memory::MemorySessionStore;
pub use session::{
    latest_completed, network_map, search_records, statistics, HostMatch, NetworkMap,
    NetworkSummary, PortCount, RunStatus, SessionRecord, SessionStore, SessionTotals,
    StoreStatistics,
};
