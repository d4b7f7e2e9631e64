pub mod scheduler;
pub mod tracking_models;
pub mod tracking_service;
pub mod tracking_store;

pub use scheduler::{DeliveryError, StartOutcome, StatsSink, StopOutcome, TrackingScheduler};
pub use tracking_models::{GuildTrackingConfig, TrackingConfigPatch};
pub use tracking_service::{TrackingError, TrackingService};
pub use tracking_store::{StoreError, TrackingConfigStore};
