//! State access for the operator: raw key/value backends and the typed
//! object client built on top of them.

pub mod backend;
pub mod client;
pub mod error;
pub mod memory;
pub mod objects;

pub use error::StoreError;
