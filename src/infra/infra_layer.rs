// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "permissions/json_store.rs"]
pub mod permissions;

#[path = "roblox/games_client.rs"]
pub mod roblox;

#[path = "tracking/json_store.rs"]
pub mod tracking;
