//! Scripted channel + session creation for the administrative API.

use std::sync::Arc;

use {
    serde::Serialize,
    serenity::all::{ChannelId, ChannelType, CreateChannel, GuildId, Http},
    tracing::{error, info, warn},
};

use opencord_backend::extract_text;

use crate::{
    chunk::{DISCORD_MAX_MESSAGE_LEN, chunk_message},
    error::{Error, Result},
    state::BotState,
};

/// What a trigger produced. `error` is set when the channel and session
/// came up but the prompt exchange failed; nothing is rolled back in that
/// case, so callers still get usable identifiers.
#[derive(Debug, Clone, Serialize)]
pub struct TriggerOutcome {
    pub channel_id: u64,
    pub channel_name: String,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Create a channel (under an optional category), create a session, bind
/// the two, and run one prompt exchange with chunked delivery.
pub async fn run_trigger(
    state: &BotState,
    channel_name: &str,
    prompt: &str,
    category: Option<&str>,
) -> Result<TriggerOutcome> {
    let (http, guilds) = state.gateway().ok_or(Error::NotReady)?;
    let guild_id = guilds.first().copied().ok_or(Error::NoGuildAvailable)?;

    let mut create = CreateChannel::new(channel_name).kind(ChannelType::Text);
    if let Some(category_name) = category {
        let parent = resolve_category(&http, guild_id, category_name).await?;
        create = create.category(parent);
    }

    let channel = guild_id.create_channel(&http, create).await?;
    info!(
        channel = %channel.name,
        channel_id = channel.id.get(),
        "created trigger channel"
    );

    let session = state.backend.create_session(Some(channel_name)).await?;
    state
        .registry
        .bind_if_absent(channel.id.get(), session.id.clone())?;
    info!(
        session_id = %session.id,
        channel_id = channel.id.get(),
        "bound trigger session"
    );

    let error = match state.backend.send_message(&session.id, prompt, None, None).await {
        Ok(response) => {
            let reply = extract_text(&response);
            let mut delivery_error = None;
            for chunk in chunk_message(&reply, DISCORD_MAX_MESSAGE_LEN) {
                if let Err(e) = channel.id.say(&http, chunk).await {
                    warn!(channel_id = channel.id.get(), error = %e, "failed to deliver reply chunk");
                    delivery_error = Some(format!("failed to deliver response: {e}"));
                    break;
                }
            }
            delivery_error
        },
        Err(e) => {
            error!(session_id = %session.id, error = %e, "trigger prompt failed");
            Some(e.to_string())
        },
    };

    Ok(TriggerOutcome {
        channel_id: channel.id.get(),
        channel_name: channel.name.clone(),
        session_id: session.id,
        error,
    })
}

/// Find a category by name (Discord uppercases them in the UI, so the
/// match is case-insensitive), creating it when absent.
async fn resolve_category(http: &Arc<Http>, guild_id: GuildId, name: &str) -> Result<ChannelId> {
    let channels = guild_id.channels(http).await?;
    if let Some(existing) = channels.values().find(|channel| {
        channel.kind == ChannelType::Category && channel.name.eq_ignore_ascii_case(name)
    }) {
        return Ok(existing.id);
    }

    let created = guild_id
        .create_channel(http, CreateChannel::new(name).kind(ChannelType::Category))
        .await?;
    info!(category = %created.name, "created category");
    Ok(created.id)
}
