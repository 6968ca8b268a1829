//! State store key layout.

/// Root prefix under which every object is stored.
pub const REGISTRY_PREFIX: &str = "/registry";

/// Resource version assigned to a freshly created object.
pub const INITIAL_RESOURCE_VERSION: u64 = 1;
