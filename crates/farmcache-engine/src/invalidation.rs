//! Invalidation channel consumer
//!
//! Each orchestrator subscribes once to its wildcard channel pattern and
//! consumes inbound messages on an independent tokio task - a
//! message-passing boundary decoupled from request-processing threads.
//! The subscription is terminal for the engine lifetime: there is no
//! unsubscribe path in normal operation, only resubscription after a
//! dropped pub/sub connection.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use farmcache_domain::ports::{ChannelMessage, RemoteStore};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(300);

/// Handler for inbound invalidation messages
///
/// Implementations parse the message grammar, drop their own echoes, and
/// apply local-only mutations. Nothing an inbound message does may
/// publish again.
#[async_trait]
pub(crate) trait MessageDispatch: Send + Sync + 'static {
    async fn dispatch(&self, message: ChannelMessage);
}

/// Subscribe to a channel pattern and consume it until the process exits
pub(crate) fn spawn_listener(
    remote: Arc<dyn RemoteStore>,
    pattern: String,
    dispatch: Arc<dyn MessageDispatch>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut backoff = INITIAL_BACKOFF;
        loop {
            match remote.subscribe(&pattern).await {
                Ok(mut stream) => {
                    debug!(pattern = %pattern, "Invalidation channel subscribed");
                    backoff = INITIAL_BACKOFF;
                    while let Some(message) = stream.next().await {
                        dispatch.dispatch(message).await;
                    }
                    warn!(pattern = %pattern, "Invalidation stream closed; resubscribing");
                    tokio::time::sleep(INITIAL_BACKOFF).await;
                }
                Err(e) => {
                    error!(
                        pattern = %pattern,
                        error = %e,
                        backoff_secs = backoff.as_secs(),
                        "Invalidation subscribe failed; retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
            }
        }
    })
}
