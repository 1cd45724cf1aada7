use anyhow::Result;
use redis::{AsyncCommands, Client};

/// Redis-backed store for per-session transient state: the pending diary
/// draft awaiting its location, and the last area-search result set.
/// Each write overwrites the previous value and refreshes the TTL; there
/// is no other expiry logic.
#[derive(Clone)]
pub struct SessionStore {
    client: Client,
    ttl_seconds: u64,
}

impl SessionStore {
    pub async fn connect(redis_url: &str, ttl_seconds: u64) -> Result<Self> {
        let client = Client::open(redis_url)?;
        let mut conn = client.get_multiplexed_async_connection().await?;
        redis::cmd("PING").query_async::<_, String>(&mut conn).await?;
        Ok(Self {
            client,
            ttl_seconds,
        })
    }

    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("PING").query_async::<_, String>(&mut conn).await?;
        Ok(())
    }

    pub async fn put_draft(&self, session_id: &str, content: &str) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.set_ex::<_, _, ()>(draft_key(session_id), content, self.ttl_seconds)
            .await?;
        Ok(())
    }

    pub async fn draft(&self, session_id: &str) -> Result<Option<String>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let value: Option<String> = conn.get(draft_key(session_id)).await?;
        Ok(value)
    }

    /// Fetch and clear the draft in one step; publishing consumes it.
    pub async fn take_draft(&self, session_id: &str) -> Result<Option<String>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = draft_key(session_id);
        let value: Option<String> = conn.get(&key).await?;
        if value.is_some() {
            conn.del::<_, ()>(&key).await?;
        }
        Ok(value)
    }

    pub async fn put_area_results(&self, session_id: &str, results_json: &str) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.set_ex::<_, _, ()>(results_key(session_id), results_json, self.ttl_seconds)
            .await?;
        Ok(())
    }

    pub async fn area_results(&self, session_id: &str) -> Result<Option<String>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let value: Option<String> = conn.get(results_key(session_id)).await?;
        Ok(value)
    }
}

fn draft_key(session_id: &str) -> String {
    format!("session:{}:draft", session_id)
}

fn results_key(session_id: &str) -> String {
    format!("session:{}:area_results", session_id)
}
