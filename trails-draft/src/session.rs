use crate::draft::Draft;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

pub type SessionResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Session collaborator: a per-visitor key-value slot holding the draft,
/// keyed by the bearer token subject. Survives across requests; implementors
/// decide expiry.
#[async_trait]
pub trait DraftSessions: Send + Sync {
    async fn load(&self, subject: &str) -> SessionResult<Option<Draft>>;

    async fn save(&self, subject: &str, draft: &Draft) -> SessionResult<()>;

    async fn clear(&self, subject: &str) -> SessionResult<()>;
}

/// Process-local session store for tests and local development.
#[derive(Default)]
pub struct MemorySessions {
    drafts: RwLock<HashMap<String, Draft>>,
}

impl MemorySessions {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DraftSessions for MemorySessions {
    async fn load(&self, subject: &str) -> SessionResult<Option<Draft>> {
        Ok(self.drafts.read().await.get(subject).cloned())
    }

    async fn save(&self, subject: &str, draft: &Draft) -> SessionResult<()> {
        self.drafts
            .write()
            .await
            .insert(subject.to_string(), draft.clone());
        Ok(())
    }

    async fn clear(&self, subject: &str) -> SessionResult<()> {
        self.drafts.write().await.remove(subject);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sessions_are_isolated_per_subject() {
        let sessions = MemorySessions::new();
        let draft = Draft::new();

        sessions.save("visitor-a", &draft).await.unwrap();

        assert!(sessions.load("visitor-a").await.unwrap().is_some());
        assert!(sessions.load("visitor-b").await.unwrap().is_none());

        sessions.clear("visitor-a").await.unwrap();
        assert!(sessions.load("visitor-a").await.unwrap().is_none());
    }
}
