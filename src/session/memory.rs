use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use super::store::{SessionData, SessionError, SessionStore};

/// In-process session backend. Records vanish with the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    records: DashMap<String, (SessionData, DateTime<Utc>)>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, id: &str) -> Result<Option<SessionData>, SessionError> {
        let now = Utc::now();
        let live = self
            .records
            .get(id)
            .filter(|record| record.value().1 > now)
            .map(|record| record.value().0.clone());
        if live.is_none() {
            self.records.remove_if(id, |_, (_, expires_at)| *expires_at <= now);
        }
        Ok(live)
    }

    async fn set(
        &self,
        id: &str,
        data: &SessionData,
        expires_at: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        self.records
            .insert(id.to_owned(), (data.clone(), expires_at));
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), SessionError> {
        self.records.remove(id);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, SessionError> {
        let now = Utc::now();
        let before = self.records.len();
        self.records.retain(|_, (_, expires_at)| *expires_at > now);
        Ok(before.saturating_sub(self.records.len()) as u64)
    }
}
