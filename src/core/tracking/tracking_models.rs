use serde::{Deserialize, Serialize};

/// How often a guild's tracking loop wakes when nobody has tuned it.
pub const DEFAULT_INTERVAL_SECS: u64 = 65;
/// Lowest interval a guild may configure. Anything below is rejected.
pub const MIN_INTERVAL_SECS: u64 = 30;
/// Default visit-milestone rounding step.
pub const DEFAULT_MILESTONE_STEP: u64 = 100;

/// Per-guild tracking record. `game_id` and `channel_id` stay `None` until
/// the matching setter command has run; the scheduler skips ticks for
/// incomplete records rather than erroring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildTrackingConfig {
    pub guild_id: u64,
    #[serde(default)]
    pub game_id: Option<u64>,
    #[serde(default)]
    pub channel_id: Option<u64>,
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
    #[serde(default = "default_step")]
    pub milestone_step: u64,
    #[serde(default)]
    pub active: bool,
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_SECS
}

fn default_step() -> u64 {
    DEFAULT_MILESTONE_STEP
}

impl GuildTrackingConfig {
    pub fn new(guild_id: u64) -> Self {
        Self {
            guild_id,
            game_id: None,
            channel_id: None,
            interval_secs: DEFAULT_INTERVAL_SECS,
            milestone_step: DEFAULT_MILESTONE_STEP,
            active: false,
        }
    }

    /// Merge the set fields of `patch` into this record.
    pub fn apply(&mut self, patch: &TrackingConfigPatch) {
        if let Some(game_id) = patch.game_id {
            self.game_id = Some(game_id);
        }
        if let Some(channel_id) = patch.channel_id {
            self.channel_id = Some(channel_id);
        }
        if let Some(interval) = patch.interval_secs {
            self.interval_secs = interval;
        }
        if let Some(step) = patch.milestone_step {
            self.milestone_step = step;
        }
    }

    /// A tick can only fetch and deliver once both halves are configured.
    pub fn is_complete(&self) -> bool {
        self.game_id.is_some() && self.channel_id.is_some()
    }
}

/// Partial update for `upsert`: only the `Some` fields are written.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackingConfigPatch {
    pub game_id: Option<u64>,
    pub channel_id: Option<u64>,
    pub interval_secs: Option<u64>,
    pub milestone_step: Option<u64>,
}
