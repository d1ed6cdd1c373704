//! Session Tool State
//!
//! Per-session records of requested/discovered tools, recent failures, and
//! tools that have worked, held in a process-wide registry keyed by session
//! id.
//!
//! - [`ring`] - fixed-capacity ring buffer
//! - [`state`] - session state and registry

pub mod ring;
pub mod state;

pub use ring::RingBuffer;
pub use state::{
    ErrorRecord, SessionCleanup, SessionRegistry, SessionToolState, ToolRequestRecord,
    RECENT_ERROR_CAPACITY,
};
