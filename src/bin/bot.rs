use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info};
use serenity::async_trait;
use serenity::model::application::interaction::Interaction;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use std::sync::Arc;
use std::time::Duration;

use goalkeeper::commands::CommandHandler;
use goalkeeper::core::Config;
use goalkeeper::database::Database;
use goalkeeper::features::dialog::ReplyRouter;
use goalkeeper::features::reminders::ReminderScheduler;
use goalkeeper::message_components::MessageComponentHandler;

struct Handler {
    command_handler: Arc<CommandHandler>,
    component_handler: Arc<MessageComponentHandler>,
}

impl Handler {
    fn new(command_handler: CommandHandler, component_handler: MessageComponentHandler) -> Self {
        Handler {
            command_handler: Arc::new(command_handler),
            component_handler: Arc::new(component_handler),
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        if let Err(e) = self.command_handler.handle_message(&ctx, &msg).await {
            error!("Error handling message: {e}");
            if let Err(why) = msg
                .channel_id
                .say(
                    &ctx.http,
                    "Sorry, I encountered an error processing your message.",
                )
                .await
            {
                error!("Failed to send error message: {why}");
            }
        }
    }

    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("🎉 {} is connected and ready!", ready.user.name);
        info!("📡 Connected to {} guilds", ready.guilds.len());
        info!("🤖 Bot ID: {}", ready.user.id);
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::MessageComponent(component) = interaction {
            if let Err(e) = self
                .component_handler
                .handle_component_interaction(&ctx, &component)
                .await
            {
                error!(
                    "Error handling component interaction '{}': {}",
                    component.data.custom_id, e
                );
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting Goalkeeper bot...");

    let database = Database::new(&config.database_path).await?;

    let reply_router = ReplyRouter::new(Duration::from_secs(config.reply_timeout_secs));
    let scheduler = ReminderScheduler::new(
        database.clone(),
        Duration::from_secs(config.scheduler_tick_secs),
    );

    // Rebuild the schedule from stored reminders; the reminders table is
    // the only durable source of pending events
    let reloaded = scheduler.reload().await?;
    info!("⏰ {reloaded} reminder(s) restored from the database");

    let command_handler =
        CommandHandler::new(database.clone(), scheduler.clone(), reply_router);
    let component_handler = MessageComponentHandler::new(database, scheduler.clone());

    let handler = Handler::new(command_handler, component_handler);

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {e}");
            anyhow::anyhow!("Client creation failed: {}", e)
        })?;

    info!("Bot configured successfully. Connecting to Discord gateway...");

    // Run the reminder scheduler for the life of the process
    let http = client.cache_and_http.http.clone();
    tokio::spawn(async move {
        scheduler.run(http).await;
    });

    if let Err(why) = client.start().await {
        error!("Gateway connection failed: {why:?}");
        return Err(anyhow::anyhow!(
            "Failed to establish gateway connection: {}",
            why
        ));
    }

    Ok(())
}
