//! Viewer-side client for the sqlscope observer server.
//!
//! Runs entirely in the viewer process. This crate knows how to *find*
//! a live server (the observer may restart and land on a different port
//! of its search range), keep a session alive across drops, and speak
//! the session protocol once connected:
//!
//! - [`discovery`] -- sequential, timeout-bounded probing of candidate
//!   ports, seeded by the last port that worked
//! - [`session`] -- the per-connection protocol state machine
//!   (`Connecting -> Handshaking -> Ready -> Disconnected`)
//! - [`client`] -- the long-running session runner with automatic
//!   reconnection after a fixed backoff
//! - [`persist`] -- the viewer's locally persisted endpoint state
//! - [`admin`] -- one-shot REST calls to the server's admin surface
//!
//! Rendering is someone else's job: this crate surfaces protocol events
//! and leaves presentation to whatever frontend consumes them.

pub mod admin;
pub mod client;
pub mod discovery;
pub mod error;
pub mod persist;
pub mod session;

pub use client::{ViewerClient, ViewerConfig};
pub use discovery::{connect, probe_order, PROBE_TIMEOUT, RECONNECT_BACKOFF};
pub use error::ViewerError;
pub use persist::ViewerState;
pub use session::{Session, SessionState};
