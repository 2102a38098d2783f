//! Plugin event loop.

use std::future::Future;

use karma_core::{EventResponder, KarmaResult};
use karma_dazeus::DaZeusClient;
use tracing::{debug, info, warn};

/// Serve events until `shutdown` resolves or the connection fails.
///
/// Each event is handled to completion, replies included, before the next
/// one is read. Failed replies are logged and skipped; only fatal errors end
/// the loop.
pub async fn run_event_loop<F>(
    client: &DaZeusClient,
    responder: &EventResponder,
    shutdown: F,
) -> KarmaResult<()>
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        let event = tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                return Ok(());
            }
            event = client.next_event() => event?,
        };

        if !event.is_privmsg() {
            debug!(event = %event.event, "Ignoring event");
            continue;
        }

        for reply in responder.handle_params(&event.params).await {
            if let Err(e) = client
                .message(&reply.network, &reply.target, &reply.text)
                .await
            {
                if e.is_fatal() {
                    return Err(e);
                }
                warn!(
                    network = %reply.network,
                    target = %reply.target,
                    "Failed to send reply: {}",
                    e
                );
            }
        }
    }
}
