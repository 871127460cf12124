use async_trait::async_trait;
use redis::{AsyncCommands, RedisResult};
use std::sync::Arc;
use trails_draft::{Draft, DraftSessions, SessionResult};

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    pub async fn set_draft(&self, subject: &str, json: &str, ttl_seconds: u64) -> RedisResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("draft:{}", subject);
        conn.set_ex::<_, _, ()>(key, json, ttl_seconds).await?;
        Ok(())
    }

    pub async fn get_draft(&self, subject: &str) -> RedisResult<Option<String>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("draft:{}", subject);
        conn.get(key).await
    }

    pub async fn del_draft(&self, subject: &str) -> RedisResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("draft:{}", subject);
        conn.del(key).await
    }

    pub async fn check_rate_limit(
        &self,
        key: &str,
        limit: i64,
        window_seconds: i64,
    ) -> RedisResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let (count,): (i64,) = redis::pipe()
            .atomic()
            .incr(key, 1)
            .expire(key, window_seconds)
            .query_async(&mut conn)
            .await?;

        Ok(count <= limit)
    }
}

/// Redis-backed session collaborator: one JSON draft per visitor subject,
/// expiring after the configured idle TTL.
pub struct RedisSessions {
    redis: Arc<RedisClient>,
    ttl_seconds: u64,
}

impl RedisSessions {
    pub fn new(redis: Arc<RedisClient>, ttl_seconds: u64) -> Self {
        Self { redis, ttl_seconds }
    }
}

#[async_trait]
impl DraftSessions for RedisSessions {
    async fn load(&self, subject: &str) -> SessionResult<Option<Draft>> {
        let Some(json) = self.redis.get_draft(subject).await? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&json)?))
    }

    async fn save(&self, subject: &str, draft: &Draft) -> SessionResult<()> {
        let json = serde_json::to_string(draft)?;
        self.redis.set_draft(subject, &json, self.ttl_seconds).await?;
        Ok(())
    }

    async fn clear(&self, subject: &str) -> SessionResult<()> {
        self.redis.del_draft(subject).await?;
        Ok(())
    }
}
