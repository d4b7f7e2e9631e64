use crate::discord::commands::tracking::{Context, Error};

const COMMAND_LIST: &[(&str, &str)] = &[
    ("/setgame <universe_id>", "Set which Roblox game to track"),
    ("/setchannel", "Post stats updates in the current channel"),
    ("/setinterval <seconds>", "Change how often stats are posted"),
    ("/setstep <step>", "Change the visit-milestone rounding step"),
    ("/start", "Start posting stats updates"),
    ("/stop", "Stop posting stats updates"),
    ("/status", "Show this server's tracking configuration"),
    ("/whitelist <user>", "Allow a user to control the bot"),
    ("/unwhitelist <user>", "Revoke a user's control access"),
    ("/help", "Show this list"),
];

/// Show available bot commands.
#[poise::command(slash_command, prefix_command)]
pub async fn help(ctx: Context<'_>) -> Result<(), Error> {
    let mut lines = vec!["📜 **Available Commands:**".to_string()];
    for (usage, description) in COMMAND_LIST {
        lines.push(format!("`{}` - {}", usage, description));
    }
    ctx.say(lines.join("\n")).await?;
    Ok(())
}
