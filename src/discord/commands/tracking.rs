// Discord commands for game-stats tracking.
//
// **Notice the pattern:**
// 1. Extract primitive data from Discord types
// 2. Call core service / scheduler
// 3. Format the response based on the result
//
// This layer is THIN - no business logic, just translation. Every command
// is hybrid (slash + `!` prefix) so both surfaces share one handler.

use crate::core::permissions::WhitelistService;
use crate::core::tracking::{
    StartOutcome, StopOutcome, TrackingError, TrackingScheduler, TrackingService,
};
use crate::discord::delivery::DiscordStatsSink;
use crate::infra::permissions::JsonWhitelistStore;
use crate::infra::roblox::RobloxGamesClient;
use crate::infra::tracking::JsonTrackingStore;
use poise::serenity_prelude::Mentionable;
use std::sync::Arc;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Data that's shared across all commands.
pub struct Data {
    pub tracking: Arc<TrackingService<JsonTrackingStore>>,
    pub scheduler:
        Arc<TrackingScheduler<JsonTrackingStore, RobloxGamesClient, DiscordStatsSink>>,
    pub whitelist: Arc<WhitelistService<JsonWhitelistStore>>,
}

/// Command check: only whitelisted users (and the owner) may control the
/// bot. Rejections always get an explicit reply, never a silent drop.
pub async fn whitelisted(ctx: Context<'_>) -> Result<bool, Error> {
    let allowed = ctx
        .data()
        .whitelist
        .is_allowed(ctx.author().id.get())
        .await?;
    if !allowed {
        ctx.say("⛔ You are not whitelisted to control this bot.")
            .await?;
    }
    Ok(allowed)
}

fn guild_id(ctx: &Context<'_>) -> Result<u64, Error> {
    Ok(ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get())
}

/// Set which Roblox game (universe id) to track.
#[poise::command(slash_command, prefix_command, guild_only, check = "whitelisted")]
pub async fn setgame(
    ctx: Context<'_>,
    #[description = "Universe id of the game to track"] universe_id: u64,
) -> Result<(), Error> {
    let guild_id = guild_id(&ctx)?;
    ctx.data().tracking.set_game(guild_id, universe_id).await?;
    ctx.say(format!("✅ Game set to **{}**", universe_id))
        .await?;
    Ok(())
}

/// Use the current channel for stats updates.
#[poise::command(slash_command, prefix_command, guild_only, check = "whitelisted")]
pub async fn setchannel(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = guild_id(&ctx)?;
    let channel_id = ctx.channel_id();
    ctx.data()
        .tracking
        .set_channel(guild_id, channel_id.get())
        .await?;
    ctx.say(format!("✅ Channel set to {}", channel_id.mention()))
        .await?;
    Ok(())
}

/// Change how often stats are posted.
#[poise::command(slash_command, prefix_command, guild_only, check = "whitelisted")]
pub async fn setinterval(
    ctx: Context<'_>,
    #[description = "Seconds between updates"] seconds: u64,
) -> Result<(), Error> {
    let guild_id = guild_id(&ctx)?;
    match ctx.data().tracking.set_interval(guild_id, seconds).await {
        Ok(_) => {
            // Re-arm a running timer; no-op when tracking is stopped.
            ctx.data().scheduler.update_interval(guild_id, seconds);
            ctx.say(format!("✅ Update interval set to **{}s**.", seconds))
                .await?;
        }
        Err(err @ TrackingError::IntervalTooLow { .. }) => {
            ctx.say(format!("❌ {}", err)).await?;
        }
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

/// Change the visit-milestone rounding step.
#[poise::command(slash_command, prefix_command, guild_only, check = "whitelisted")]
pub async fn setstep(
    ctx: Context<'_>,
    #[description = "Milestone rounding step, e.g. 100"] step: u64,
) -> Result<(), Error> {
    let guild_id = guild_id(&ctx)?;
    match ctx.data().tracking.set_step(guild_id, step).await {
        Ok(_) => {
            ctx.say(format!("✅ Milestone step set to **{}**.", step))
                .await?;
        }
        Err(err @ TrackingError::InvalidStep) => {
            ctx.say(format!("❌ {}", err)).await?;
        }
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

/// Start posting stats updates in this server.
#[poise::command(slash_command, prefix_command, guild_only, check = "whitelisted")]
pub async fn start(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = guild_id(&ctx)?;

    let config = ctx.data().tracking.config(guild_id).await?;
    if !config.as_ref().is_some_and(|c| c.is_complete()) {
        ctx.say("⚠️ Please run `/setgame <id>` and `/setchannel` first.")
            .await?;
        return Ok(());
    }

    match ctx.data().scheduler.start(guild_id).await {
        StartOutcome::AlreadyRunning => {
            ctx.say("⚠️ Stats updates are already running here.").await?;
        }
        StartOutcome::Started => {
            ctx.data().tracking.set_active(guild_id, true).await?;
            ctx.say("✅ Stats updates **started**!").await?;
        }
    }
    Ok(())
}

/// Stop posting stats updates in this server.
#[poise::command(slash_command, prefix_command, guild_only, check = "whitelisted")]
pub async fn stop(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = guild_id(&ctx)?;

    match ctx.data().scheduler.stop(guild_id) {
        StopOutcome::NotRunning => {
            ctx.say("⚠️ No stats updates running in this server.")
                .await?;
        }
        StopOutcome::Stopped => {
            ctx.data().tracking.set_active(guild_id, false).await?;
            ctx.say("🛑 Stats updates **stopped**!").await?;
        }
    }
    Ok(())
}

/// Show the tracking configuration for this server.
#[poise::command(slash_command, prefix_command, guild_only, check = "whitelisted")]
pub async fn status(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = guild_id(&ctx)?;

    let Some(config) = ctx.data().tracking.config(guild_id).await? else {
        ctx.say("ℹ️ Nothing configured yet. Run `/setgame <id>` and `/setchannel` to begin.")
            .await?;
        return Ok(());
    };

    let game = config
        .game_id
        .map(|id| format!("**{}**", id))
        .unwrap_or_else(|| "*not set*".to_string());
    let channel = config
        .channel_id
        .map(|id| format!("<#{}>", id))
        .unwrap_or_else(|| "*not set*".to_string());
    let running = ctx.data().scheduler.is_running(guild_id);

    ctx.say(format!(
        "📊 **Tracking Status**\n\
         🎮 Game: {}\n\
         📢 Channel: {}\n\
         ⏱️ Interval: **{}s**\n\
         🎯 Milestone step: **{}**\n\
         ▶️ Running: **{}**",
        game,
        channel,
        config.interval_secs,
        config.milestone_step,
        if running { "yes" } else { "no" },
    ))
    .await?;
    Ok(())
}
