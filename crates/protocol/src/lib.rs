//! Wire types for the Electra cloud protocol.
//!
//! This crate contains the serde-serializable types used for communication
//! with the Electra mobile API over HTTP POST + JSON. These types represent
//! the "protocol layer" - the shapes of data as they appear on the wire.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: No behavior beyond serialization/deserialization
//! * 1:1 with protocol: Match the request/response envelopes of the vendor API
//! * Stable: Changes only when the wire protocol changes
//!
//! The double-encoded `OPER`/`DIAG_L2` sub-documents are decoded and
//! re-encoded exclusively here (see [`state`]), so string-JSON handling
//! never leaks into the client crate's business logic.
//!
//! Higher-level ergonomic APIs are built on top of these types in
//! `electra-client`.

pub mod device;
pub mod envelope;
pub mod state;

pub use device::*;
pub use envelope::*;
pub use state::*;
