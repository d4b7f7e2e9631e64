// Bot presence glue. Discord SDK types only, no business logic.

use poise::serenity_prelude as serenity;

/// Called once the gateway is ready so the bot advertises what it does.
pub fn on_ready(ctx: &serenity::Context) {
    let activity = serenity::ActivityData::watching("Roblox game stats");
    ctx.set_presence(Some(activity), serenity::OnlineStatus::Online);
}
