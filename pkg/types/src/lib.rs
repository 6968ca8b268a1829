//! Object model shared by the state store and the controllers.

pub mod config;
pub mod configmap;
pub mod daemonset;
pub mod localvolume;
pub mod meta;
pub mod pod;
pub mod resource;
pub mod selector;
pub mod validate;
pub mod volume;
