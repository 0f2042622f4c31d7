//! Common type aliases used throughout the runtime.

/// Session identifier, also used as the snapshot file stem.
pub type SessionId = String;

/// Hex-encoded state root.
pub type StateHash = String;
