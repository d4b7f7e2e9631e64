// This is the entry point of the Discord bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (JSON stores, Roblox API)
// - `discord/` = Discord-specific adapters (commands, delivery, presence)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Register commands and resume persisted tracking timers

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use std::sync::Arc;

use anyhow::Context as _;
use poise::serenity_prelude as serenity;

use crate::core::permissions::WhitelistService;
use crate::core::tracking::{TrackingScheduler, TrackingService};
use crate::discord::commands::presence;
use crate::discord::delivery::DiscordStatsSink;
use crate::discord::Data;
use crate::infra::permissions::JsonWhitelistStore;
use crate::infra::roblox::RobloxGamesClient;
use crate::infra::tracking::JsonTrackingStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let token = std::env::var("DISCORD_TOKEN").context(
        "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token.",
    )?;
    let owner_id: u64 = std::env::var("OWNER_ID")
        .context("Missing OWNER_ID environment variable!")?
        .parse()
        .context("OWNER_ID must be a numeric Discord user id")?;

    // Keep runtime state files in a dedicated folder so the repo root stays tidy.
    let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string());
    std::fs::create_dir_all(&data_dir).context("Failed to create data directory")?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Create our services with their dependencies.
    // This is the "composition root" where we wire everything together.

    let tracking_store = JsonTrackingStore::new(format!("{}/tracking.json", data_dir));
    let tracking_service = Arc::new(TrackingService::new(tracking_store));

    let whitelist_store = JsonWhitelistStore::new(format!("{}/whitelist.json", data_dir));
    let whitelist_service = Arc::new(WhitelistService::new(whitelist_store, owner_id));

    let fetcher = Arc::new(RobloxGamesClient::new().context("Failed to create Roblox client")?);

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================
    // Configure the poise framework with our commands and settings.

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required for prefix commands
        | serenity::GatewayIntents::GUILDS;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            // Register all our commands here
            commands: vec![
                discord::commands::tracking::setgame(),
                discord::commands::tracking::setchannel(),
                discord::commands::tracking::setinterval(),
                discord::commands::tracking::setstep(),
                discord::commands::tracking::start(),
                discord::commands::tracking::stop(),
                discord::commands::tracking::status(),
                discord::commands::whitelist::whitelist(),
                discord::commands::whitelist::unwhitelist(),
                discord::commands::help::help(),
            ],
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some("!".to_string()),
                ..Default::default()
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                println!("🤖 Bot is starting up...");

                // Register slash commands globally (can take up to an hour to propagate)
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                println!("✅ Commands registered!");

                // The delivery sink needs the gateway's HTTP handle, so the
                // scheduler is assembled here rather than before the framework.
                let sink = Arc::new(DiscordStatsSink::new(ctx.http.clone()));
                let scheduler = Arc::new(TrackingScheduler::new(
                    Arc::clone(&tracking_service),
                    fetcher,
                    sink,
                ));

                // Resume timers for guilds that were tracking before the restart.
                match tracking_service.all_configs().await {
                    Ok(configs) => {
                        for config in configs.into_iter().filter(|c| c.active) {
                            scheduler.start(config.guild_id).await;
                            tracing::info!("Resumed tracking for guild {}", config.guild_id);
                        }
                    }
                    Err(err) => {
                        tracing::warn!("Failed to load tracking configs on startup: {}", err)
                    }
                }

                presence::on_ready(ctx);
                println!("🚀 Bot is ready!");

                Ok(Data {
                    tracking: tracking_service,
                    scheduler,
                    whitelist: whitelist_service,
                })
            })
        })
        .build();

    // Create the client and start the bot
    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .context("Error creating client")?;

    client.start().await.context("Error running bot")?;
    Ok(())
}
