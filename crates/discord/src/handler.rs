//! Discord gateway event handler.

use {
    serenity::{
        all::{Context, EventHandler, GatewayIntents, Message, Ready},
        async_trait,
    },
    tracing::{info, warn},
};

use crate::{commands, relay, state::SharedBotState};

/// Handler for Discord gateway events.
pub struct OpencordHandler {
    pub state: SharedBotState,
}

impl OpencordHandler {
    /// Required gateway intents for the bot.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT
    }
}

#[async_trait]
impl EventHandler for OpencordHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        let guilds: Vec<_> = ready.guilds.iter().map(|g| g.id).collect();
        info!(
            bot_name = %ready.user.name,
            guild_count = guilds.len(),
            "discord bot connected"
        );
        self.state.mark_ready(ctx.http.clone(), guilds);
    }

    async fn message(&self, ctx: Context, msg: Message) {
        // Skip bot messages to prevent loops, and ignore DMs.
        if msg.author.bot || msg.guild_id.is_none() {
            return;
        }

        // Resolve the guild channel; its name drives the allowlist and the
        // default session title.
        let channel_name = match msg.channel_id.to_channel(&ctx).await {
            Ok(channel) => match channel.guild() {
                Some(guild_channel) => guild_channel.name,
                None => return,
            },
            Err(e) => {
                warn!(channel_id = msg.channel_id.get(), error = %e, "failed to resolve channel");
                return;
            },
        };

        if !self.state.channel_allowed(&channel_name) {
            return;
        }

        let content = msg.content.trim();

        if let Some(input) = content.strip_prefix(self.state.settings.prefix.as_str()) {
            commands::dispatch(&self.state, &ctx.http, msg.channel_id, &channel_name, input)
                .await;
            return;
        }

        if content.is_empty() {
            return;
        }

        // Only relay when this channel has an active session.
        let Some(session_id) = self.state.registry.lookup(msg.channel_id.get()) else {
            return;
        };

        info!(
            channel = %channel_name,
            author = %msg.author.name,
            preview = %content.chars().take(80).collect::<String>(),
            "relaying message"
        );
        relay::deliver_reply(&self.state, &ctx.http, msg.channel_id, &session_id, content).await;
    }
}
