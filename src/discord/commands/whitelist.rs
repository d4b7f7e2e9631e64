// Whitelist management commands. Same thin-adapter pattern as tracking.rs;
// the owner rules live in the core service, not here.

use crate::core::permissions::WhitelistError;
use crate::discord::commands::tracking::{whitelisted, Context, Error};
use poise::serenity_prelude as serenity;

/// Allow a user to control the bot.
#[poise::command(slash_command, prefix_command, guild_only, check = "whitelisted")]
pub async fn whitelist(
    ctx: Context<'_>,
    #[description = "User to whitelist"] user: serenity::User,
) -> Result<(), Error> {
    match ctx.data().whitelist.add(user.id.get()).await {
        Ok(true) => {
            ctx.say(format!("✅ **{}** can now control the bot.", user.name))
                .await?;
        }
        Ok(false) => {
            ctx.say(format!("⚠️ **{}** is already whitelisted.", user.name))
                .await?;
        }
        Err(WhitelistError::OwnerAlwaysAllowed) => {
            ctx.say("⚠️ The owner is always whitelisted.").await?;
        }
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

/// Revoke a user's control access.
#[poise::command(slash_command, prefix_command, guild_only, check = "whitelisted")]
pub async fn unwhitelist(
    ctx: Context<'_>,
    #[description = "User to remove from the whitelist"] user: serenity::User,
) -> Result<(), Error> {
    match ctx.data().whitelist.remove(user.id.get()).await {
        Ok(()) => {
            ctx.say(format!("✅ **{}** removed from the whitelist.", user.name))
                .await?;
        }
        Err(WhitelistError::CannotRemoveOwner) => {
            ctx.say("❌ The owner cannot be removed from the whitelist.")
                .await?;
        }
        Err(WhitelistError::NotWhitelisted) => {
            ctx.say(format!("⚠️ **{}** is not on the whitelist.", user.name))
                .await?;
        }
        Err(err) => return Err(err.into()),
    }
    Ok(())
}
