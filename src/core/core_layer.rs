// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "permissions/whitelist_service.rs"]
pub mod permissions;

#[path = "stats/mod.rs"]
pub mod stats;

#[path = "tracking/mod.rs"]
pub mod tracking;
