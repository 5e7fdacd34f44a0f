//! Signal table and DBC importer
//!
//! This module contains the descriptor table the translator works on and an
//! importer for signal layouts defined in DBC files.

pub mod dbc;
pub mod database;

// Re-export key types for convenience
pub use database::{
    ByteOrder, SignalDescriptor, SignalHandle, SignalState, SignalTable, TableStats, ValueType,
};
