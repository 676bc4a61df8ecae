use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub questions: Vec<String>,
    pub answers: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            questions: Vec::new(),
            answers: Vec::new(),
            created_at: now,
        }
    }
}

/// In-memory conversations keyed by session id. Nothing is ever evicted.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn start(&self) -> String {
        let id = Uuid::new_v4().to_string();
        self.sessions
            .write()
            .await
            .insert(id.clone(), Session::new(Utc::now()));
        id
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.sessions.read().await.contains_key(id)
    }

    pub async fn get(&self, id: &str) -> Option<Session> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Record a finished turn. Returns the new question count, or `None` if the
    /// session was deleted meanwhile.
    pub async fn append(&self, id: &str, question: &str, answer: &str) -> Option<usize> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(id)?;
        session.questions.push(question.to_string());
        session.answers.push(answer.to_string());
        Some(session.questions.len())
    }

    pub async fn remove(&self, id: &str) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn turns_accumulate_in_order() {
        let store = SessionStore::new();
        let id = store.start().await;
        assert!(Uuid::parse_str(&id).is_ok());

        assert_eq!(store.append(&id, "q1", "a1").await, Some(1));
        assert_eq!(store.append(&id, "q2", "a2").await, Some(2));

        let session = store.get(&id).await.unwrap();
        assert_eq!(session.questions, ["q1", "q2"]);
        assert_eq!(session.answers, ["a1", "a2"]);
    }

    #[tokio::test]
    async fn removed_sessions_are_gone() {
        let store = SessionStore::new();
        let id = store.start().await;
        assert!(store.remove(&id).await);
        assert!(!store.remove(&id).await);
        assert!(!store.contains(&id).await);
        assert_eq!(store.append(&id, "q", "a").await, None);
        assert_eq!(store.len().await, 0);
    }
}
