//! Command handlers for the yin-yang command line.
//!
//! Each action parsed by [`crate::args`] maps to one submodule. The handlers
//! take their collaborators (store, host paths, registry) as arguments so
//! they can run against a sandboxed home in tests; `main` passes the real
//! ones.

pub mod schedule;
pub mod themes;
pub mod toggle;

pub use schedule::start_daemon;
pub use themes::list_themes;
pub use toggle::toggle;
