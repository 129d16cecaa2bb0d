use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        round::RoundSnapshot,
        sse::{Handshake, NavigateEvent, ServerEvent},
    },
    state::{SseHub, effects::MatchExit},
};

const EVENT_ROUND_SNAPSHOT: &str = "round.snapshot";
const EVENT_NAVIGATE: &str = "navigate";
const EVENT_INFO: &str = "info";

/// Broadcast the latest match snapshot to every renderer.
pub fn broadcast_snapshot(hub: &SseHub, snapshot: &RoundSnapshot) {
    send_public_event(hub, EVENT_ROUND_SNAPSHOT, snapshot);
}

/// Tell renderers to leave the match view.
pub fn broadcast_navigate(hub: &SseHub, exit: &MatchExit) {
    send_public_event(hub, EVENT_NAVIGATE, &NavigateEvent(exit.clone()));
}

/// Greet a freshly connected renderer.
pub fn broadcast_handshake(hub: &SseHub, match_active: bool) {
    let payload = Handshake {
        message: "round stream connected".into(),
        match_active,
    };
    send_public_event(hub, EVENT_INFO, &payload);
}

fn send_public_event(hub: &SseHub, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => {
            hub.broadcast(event);
        }
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn navigate_payload_is_tagged() {
        let hub = SseHub::new(4);
        let mut receiver = hub.subscribe();
        broadcast_navigate(
            &hub,
            &MatchExit::Submitted {
                redirect: "/result".into(),
            },
        );

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some(EVENT_NAVIGATE));
        let payload: serde_json::Value = serde_json::from_str(&event.data).unwrap();
        assert_eq!(
            payload,
            serde_json::json!({"kind": "submitted", "redirect": "/result"})
        );
    }
}
