use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::{StreamExt, wrappers::ReceiverStream};
use tracing::{info, warn};

use crate::{dto::sse::ServerEvent, state::SharedState};

/// Subscribe to the round stream.
pub fn subscribe_public(state: &SharedState) -> broadcast::Receiver<ServerEvent> {
    state.public_sse().subscribe()
}

/// Convert a broadcast receiver into an SSE response, forwarding events until the
/// client disconnects.
pub fn to_sse_stream(
    receiver: broadcast::Receiver<ServerEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<ServerEvent>(8);
    tokio::spawn(forward(receiver, tx));

    let stream = ReceiverStream::new(rx).map(|payload| Ok(to_event(payload)));
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

async fn forward(mut receiver: broadcast::Receiver<ServerEvent>, tx: mpsc::Sender<ServerEvent>) {
    loop {
        tokio::select! {
            _ = tx.closed() => break,
            recv_result = receiver.recv() => {
                match recv_result {
                    Ok(payload) => {
                        if tx.send(payload).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Closed) => break,
                    Err(RecvError::Lagged(skipped)) => {
                        // Skipped audio commands are lost; only snapshots are replaced.
                        warn!(skipped, "round SSE subscriber lagged");
                        continue;
                    }
                }
            }
        }
    }

    info!("Round SSE stream disconnected");
}

fn to_event(payload: ServerEvent) -> Event {
    let event = Event::default().data(payload.data);
    match payload.event {
        Some(name) => event.event(name),
        None => event,
    }
}
