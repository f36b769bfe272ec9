//! Command implementations

pub mod inventory;
pub mod keyscan;
pub mod provision;
pub mod version;
