//! Reconciliation engine for the diskmaker node-daemon fleet.
//!
//! [`nodedaemon::DaemonReconciler`] drives one pass per trigger: retire the
//! legacy daemon sets once, aggregate the fleet definitions, then
//! create-or-update the provisioner config map and the diskmaker daemon set.

pub mod aggregate;
pub mod backoff;
pub mod diskmaker;
pub mod error;
pub mod fingerprint;
pub mod legacy;
pub mod nodedaemon;
pub mod upsert;

#[cfg(test)]
mod testutil;

pub use error::ReconcileError;
