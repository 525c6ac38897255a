//! Shared type definitions for the sqlscope live database observer.
//!
//! This crate is the single source of truth for everything that crosses the
//! wire between the server and its viewers. Types defined here flow downstream
//! to `TypeScript` via `ts-rs` for the dashboard frontend.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for identifiers
//! - [`protocol`] -- The session protocol message vocabulary and payloads

pub mod ids;
pub mod protocol;

// Re-export all public types at crate root for convenience.
pub use ids::SessionId;
pub use protocol::{ClientMessage, ServerMessage, SwitchAck, TableData};

#[cfg(test)]
mod tests {
    //! Integration tests for type exports and `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // ts-rs generates TypeScript bindings when types with
        // #[ts(export)] are used. Importing them here triggers generation.
        // The actual files are written to the `bindings/` directory
        // relative to the crate root.
        use ts_rs::TS;

        let _ = crate::ids::SessionId::export_all();
        let _ = crate::protocol::ServerMessage::export_all();
        let _ = crate::protocol::ClientMessage::export_all();
        let _ = crate::protocol::TableData::export_all();
        let _ = crate::protocol::SwitchAck::export_all();
    }
}
