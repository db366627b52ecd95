use super::{CounterStore, hash_fields};
use crate::error::Result;
use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use serde_json::{Map, Value};

/// Stores each snapshot as a hash on a Redis server, where dashboards poll it.
pub struct RedisStore {
    conn: MultiplexedConnection,
}

impl RedisStore {
    /// Accepts `redis://` and `rediss://` URLs.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        log::debug!("Connected to stats store at {}", client.get_connection_info().addr);
        Ok(Self { conn })
    }
}

#[async_trait]
impl CounterStore for RedisStore {
    async fn write(&self, key: &str, mapping: &Map<String, Value>) -> Result<()> {
        let fields = hash_fields(mapping);
        let mut conn = self.conn.clone();

        // Readers see either the previous snapshot or the new one.
        let mut pipe = redis::pipe();
        pipe.atomic().del(key).ignore();
        if !fields.is_empty() {
            pipe.hset_multiple(key, &fields).ignore();
        }
        pipe.query_async::<_, ()>(&mut conn).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[tokio::test]
    async fn unreachable_server_is_a_store_failure() {
        let err = RedisStore::connect("redis://127.0.0.1:1").await.err().unwrap();
        assert!(matches!(err, Error::Redis(_)), "{err}");
    }

    #[tokio::test]
    async fn malformed_url_is_rejected() {
        assert!(RedisStore::connect("redis://").await.is_err());
    }
}
