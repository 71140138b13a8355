//! Redis remote store
//!
//! Shared store for multi-instance farms. The connection is established
//! exactly once per process through a race-free async initializer; every
//! caller shares the managed connection, which reconnects after transient
//! drops instead of aborting.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tokio::sync::OnceCell;

use farmcache_domain::error::{Error, Result};
use farmcache_domain::ports::{ChannelMessage, MessageStream, RemoteStore, RemoteValue};

const DEFAULT_PORT: u16 = 6379;
const SSL_DEFAULT_PORT: u16 = 6380;

/// Bulk delete by pattern, chunked so a single DEL never exceeds the
/// server's argument limit.
const BULK_DELETE_SCRIPT: &str = r"
local keys = redis.call('KEYS', ARGV[1])
local deleted = 0
for i = 1, #keys, 1000 do
    deleted = deleted + redis.call('DEL', unpack(keys, i, math.min(i + 999, #keys)))
end
return deleted
";

/// Parsed connection configuration
///
/// Accepts `redis://` / `rediss://` URLs as-is, or a multi-host
/// `host[:port][,host2[:port2]][,option=value...]` string from which only
/// the first listed endpoint is used (it doubles as the administrative
/// endpoint for pattern scans). A bare host gets port 6379, or 6380 when
/// `ssl=true` is present. An absent `abortConnect` option is forced to
/// "do not abort": the managed connection survives transient disconnects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// First listed `host:port`
    pub primary: String,
    /// Whether TLS was requested (`rediss://` or `ssl=true`)
    pub use_tls: bool,
    /// Parsed `abortConnect` option; retained for configuration
    /// compatibility, the managed connection reconnects regardless
    pub abort_on_disconnect: bool,
    /// Connection URL handed to the client
    pub url: String,
}

impl ConnectionConfig {
    /// Parse a connection string
    ///
    /// An empty string is a fatal configuration error.
    pub fn parse(connection_string: &str) -> Result<Self> {
        let cs = connection_string.trim();
        if cs.is_empty() {
            return Err(Error::configuration(
                "The remote store connection string can't be an empty string. \
                 Check the connection_string setting.",
            ));
        }

        if cs.starts_with("redis://") || cs.starts_with("rediss://") {
            let use_tls = cs.starts_with("rediss://");
            let after_scheme = cs.split_once("://").map(|(_, rest)| rest).unwrap_or(cs);
            let primary = after_scheme
                .split('/')
                .next()
                .unwrap_or(after_scheme)
                .to_string();
            return Ok(Self {
                primary,
                use_tls,
                abort_on_disconnect: false,
                url: cs.to_string(),
            });
        }

        let mut primary: Option<String> = None;
        let mut use_tls = false;
        let mut abort_on_disconnect = false;

        for part in cs.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            if let Some((name, value)) = part.split_once('=') {
                match name.to_ascii_lowercase().as_str() {
                    "ssl" => use_tls = value.eq_ignore_ascii_case("true"),
                    "abortconnect" => abort_on_disconnect = value.eq_ignore_ascii_case("true"),
                    _ => {}
                }
            } else if primary.is_none() {
                // Only the first listed host:port is used
                primary = Some(part.to_string());
            }
        }

        let mut primary = primary.ok_or_else(|| {
            Error::configuration(format!(
                "No host found in connection string '{}'",
                connection_string
            ))
        })?;
        if !primary.contains(':') {
            let port = if use_tls { SSL_DEFAULT_PORT } else { DEFAULT_PORT };
            primary = format!("{}:{}", primary, port);
        }

        let scheme = if use_tls { "rediss" } else { "redis" };
        let url = format!("{}://{}", scheme, primary);

        Ok(Self {
            primary,
            use_tls,
            abort_on_disconnect,
            url,
        })
    }
}

/// Redis-backed remote store
pub struct RedisStore {
    client: Client,
    config: ConnectionConfig,
    connection: OnceCell<ConnectionManager>,
}

impl RedisStore {
    /// Create a store from a connection string
    ///
    /// The client is created eagerly (validating the configuration); the
    /// connection itself is established lazily on first use.
    pub fn new(connection_string: &str) -> Result<Self> {
        let config = ConnectionConfig::parse(connection_string)?;
        let client = Client::open(config.url.as_str()).map_err(|e| Error::Configuration {
            message: format!("Failed to create Redis client: {}", e),
            source: Some(Box::new(e)),
        })?;
        Ok(Self {
            client,
            config,
            connection: OnceCell::new(),
        })
    }

    /// The parsed connection configuration
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Shared managed connection; first caller connects, the rest await
    /// the same result
    async fn connection(&self) -> Result<ConnectionManager> {
        let manager = self
            .connection
            .get_or_try_init(|| async {
                self.client
                    .get_connection_manager()
                    .await
                    .map_err(|e| Error::Transport {
                        message: format!("Failed to connect to Redis: {}", e),
                        source: Some(Box::new(e)),
                    })
            })
            .await?;
        Ok(manager.clone())
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("primary", &self.config.primary)
            .field("tls", &self.config.use_tls)
            .finish()
    }
}

#[async_trait]
impl RemoteStore for RedisStore {
    async fn set(&self, key: &str, payload: &str, ttl: Option<Duration>) -> Result<()> {
        let mut conn = self.connection().await?;
        let result: redis::RedisResult<()> = match ttl {
            // Millisecond precision; clamp so an already-expired write
            // still round-trips as a valid command.
            Some(d) => {
                let ms = u64::try_from(d.as_millis()).unwrap_or(u64::MAX).max(1);
                conn.pset_ex(key, payload, ms).await
            }
            None => conn.set(key, payload).await,
        };
        result.map_err(|e| Error::Transport {
            message: format!("Redis SET failed: {}", e),
            source: Some(Box::new(e)),
        })
    }

    async fn get(&self, key: &str) -> Result<Option<RemoteValue>> {
        let mut conn = self.connection().await?;
        let (payload, pttl): (Option<String>, i64) = redis::pipe()
            .cmd("GET")
            .arg(key)
            .cmd("PTTL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::Transport {
                message: format!("Redis GET failed: {}", e),
                source: Some(Box::new(e)),
            })?;

        Ok(payload.map(|payload| RemoteValue {
            payload,
            // PTTL returns -1 for "no expiry" and -2 for "missing"
            remaining_ttl: u64::try_from(pttl).ok().map(Duration::from_millis),
        }))
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection().await?;
        let deleted: i64 = conn.del(key).await.map_err(|e| Error::Transport {
            message: format!("Redis DEL failed: {}", e),
            source: Some(Box::new(e)),
        })?;
        Ok(deleted > 0)
    }

    async fn delete_by_pattern(&self, pattern: &str) -> Result<u64> {
        let mut conn = self.connection().await?;
        redis::Script::new(BULK_DELETE_SCRIPT)
            .arg(pattern)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| Error::Transport {
                message: format!("Redis bulk delete failed: {}", e),
                source: Some(Box::new(e)),
            })
    }

    async fn publish(&self, channel: &str, payload: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        conn.publish::<_, _, ()>(channel, payload)
            .await
            .map_err(|e| Error::Transport {
                message: format!("Redis PUBLISH failed: {}", e),
                source: Some(Box::new(e)),
            })
    }

    async fn subscribe(&self, pattern: &str) -> Result<MessageStream> {
        // Pub/sub needs a dedicated connection, separate from the shared
        // command connection.
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|e| Error::Transport {
                message: format!("Failed to open Redis pub/sub connection: {}", e),
                source: Some(Box::new(e)),
            })?;
        pubsub.psubscribe(pattern).await.map_err(|e| Error::Transport {
            message: format!("Redis PSUBSCRIBE failed: {}", e),
            source: Some(Box::new(e)),
        })?;

        let stream = pubsub.into_on_message().map(|msg| ChannelMessage {
            channel: msg.get_channel_name().to_string(),
            payload: msg.get_payload::<String>().unwrap_or_default(),
        });
        Ok(Box::pin(stream))
    }

    fn store_name(&self) -> &str {
        "redis"
    }
}
