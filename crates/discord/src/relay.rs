//! Forwarding channel messages to a session and posting the reply back.

use std::sync::Arc;

use {
    serenity::all::{ChannelId, Http},
    tracing::{error, warn},
};

use opencord_backend::extract_text;

use crate::{
    chunk::{DISCORD_MAX_MESSAGE_LEN, chunk_message},
    state::BotState,
};

/// Send `text` to the bound session and deliver the reply, chunked, to the
/// channel. A backend failure produces a single error message instead; a
/// response is never partially delivered and then followed by an error.
pub(crate) async fn deliver_reply(
    state: &BotState,
    http: &Arc<Http>,
    channel_id: ChannelId,
    session_id: &str,
    text: &str,
) {
    // Typing indicator for the duration of the backend call.
    let typing = channel_id.start_typing(http);
    let outcome = state.backend.send_message(session_id, text, None, None).await;
    typing.stop();

    let response = match outcome {
        Ok(response) => response,
        Err(e) => {
            error!(session_id, error = %e, "opencode request failed");
            let _ = channel_id
                .say(http, format!("⚠️ OpenCode error: {e}"))
                .await;
            return;
        },
    };

    let reply = extract_text(&response);
    for chunk in chunk_message(&reply, DISCORD_MAX_MESSAGE_LEN) {
        if let Err(e) = channel_id.say(http, chunk).await {
            warn!(channel_id = channel_id.get(), error = %e, "failed to deliver reply chunk");
            break;
        }
    }
}
