//! The `start` / `stop` / `status` command surface.

use std::sync::Arc;

use {
    serenity::all::{ChannelId, Http},
    tracing::{info, warn},
};

use crate::{error::Result, state::BotState};

/// Parse and run a prefixed command. Unknown commands are silently
/// ignored; failures are reported into the originating channel and never
/// escape to the event loop.
pub(crate) async fn dispatch(
    state: &BotState,
    http: &Arc<Http>,
    channel_id: ChannelId,
    channel_name: &str,
    input: &str,
) {
    let mut words = input.trim().splitn(2, char::is_whitespace);
    let command = words.next().unwrap_or("");
    let argument = words.next().map(str::trim).filter(|arg| !arg.is_empty());

    let result = match command {
        "start" => start(state, http, channel_id, channel_name, argument).await,
        "stop" => stop(state, http, channel_id).await,
        "status" => status(state, http, channel_id).await,
        _ => Ok(()),
    };

    if let Err(e) = result {
        warn!(command, channel = %channel_name, error = %e, "command failed");
        let _ = channel_id.say(http, format!("⚠️ Error: {e}")).await;
    }
}

/// `!start [title]` — create a session and bind it to this channel.
async fn start(
    state: &BotState,
    http: &Arc<Http>,
    channel_id: ChannelId,
    channel_name: &str,
    title: Option<&str>,
) -> Result<()> {
    if state.registry.lookup(channel_id.get()).is_some() {
        channel_id.say(http, ALREADY_ACTIVE_MESSAGE).await?;
        return Ok(());
    }

    let title = title
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| format!("discord-{channel_name}"));

    let typing = channel_id.start_typing(http);
    let created = state.backend.create_session(Some(&title)).await;
    typing.stop();
    let session = created?;

    match state
        .registry
        .bind_if_absent(channel_id.get(), session.id.clone())
    {
        Ok(()) => {
            info!(session_id = %session.id, channel = %channel_name, "session created");
            channel_id
                .say(
                    http,
                    format!(
                        "✅ OpenCode session started (`{}…`).\n\
                         Send messages normally — I'll forward them to OpenCode.",
                        short_id(&session.id)
                    ),
                )
                .await?;
        },
        Err(_) => {
            // A concurrent start won the race; discard the session we made.
            warn!(
                session_id = %session.id,
                channel = %channel_name,
                "channel was bound concurrently, discarding session"
            );
            if let Err(e) = state.backend.delete_session(&session.id).await {
                warn!(session_id = %session.id, error = %e, "failed to delete orphaned session");
            }
            channel_id.say(http, ALREADY_ACTIVE_MESSAGE).await?;
        },
    }

    Ok(())
}

/// `!stop` — unbind and best-effort delete the channel's session.
async fn stop(state: &BotState, http: &Arc<Http>, channel_id: ChannelId) -> Result<()> {
    let Some(session_id) = state.registry.unbind(channel_id.get()) else {
        channel_id
            .say(http, "ℹ️ No active session in this channel.")
            .await?;
        return Ok(());
    };

    if let Err(e) = state.backend.delete_session(&session_id).await {
        warn!(%session_id, error = %e, "failed to delete session");
    }

    channel_id.say(http, "🛑 Session ended.").await?;
    Ok(())
}

/// `!status` — list all active bindings.
async fn status(state: &BotState, http: &Arc<Http>, channel_id: ChannelId) -> Result<()> {
    let bindings = state.registry.all();
    if bindings.is_empty() {
        channel_id.say(http, "ℹ️ No active sessions.").await?;
        return Ok(());
    }

    let mut lines = vec!["**Active sessions:**".to_string()];
    for (bound_channel, session_id) in bindings {
        let name = display_name(http, bound_channel).await;
        lines.push(format!("• #{name} → `{}…`", short_id(&session_id)));
    }
    channel_id.say(http, lines.join("\n")).await?;
    Ok(())
}

const ALREADY_ACTIVE_MESSAGE: &str =
    "⚠️ A session is already active in this channel. Use `!stop` first to end it.";

/// Channel display name, falling back to the raw id.
async fn display_name(http: &Arc<Http>, channel_id: u64) -> String {
    match ChannelId::new(channel_id).to_channel(http).await {
        Ok(channel) => channel
            .guild()
            .map(|guild_channel| guild_channel.name)
            .unwrap_or_else(|| channel_id.to_string()),
        Err(_) => channel_id.to_string(),
    }
}

fn short_id(session_id: &str) -> &str {
    &session_id[..session_id.floor_char_boundary(8)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_id_truncates_long_ids() {
        assert_eq!(short_id("ses_0123456789"), "ses_0123");
    }

    #[test]
    fn short_id_keeps_short_ids_whole() {
        assert_eq!(short_id("ses"), "ses");
    }
}
