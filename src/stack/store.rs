//! Data access for stack records.
//!
//! The panel only talks to [`StackStore`]; [`MemoryStore`] is the bundled
//! implementation, optionally seeded from a JSON file at startup.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use color_eyre::eyre::eyre;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::stack::error::StackError;
use crate::stack::form::validate;
use crate::stack::model::{Stack, StackId, StackPayload, WinHistory};

#[async_trait]
pub trait StackStore: Send + Sync {
    /// List stacks, newest first.
    async fn list_stacks(&self, enabled_only: bool) -> Result<Vec<Stack>, StackError>;

    async fn fetch_stack(&self, id: &StackId) -> Result<Stack, StackError>;

    async fn create_stack(&self, payload: StackPayload) -> Result<Stack, StackError>;

    async fn update_stack(&self, id: &StackId, payload: StackPayload) -> Result<Stack, StackError>;

    async fn delete_stack(&self, id: &StackId) -> Result<(), StackError>;

    /// Payouts of one stack, or of every stack when `stack_id` is `None`,
    /// newest first. An unknown stack simply has no history.
    async fn list_win_history(
        &self,
        stack_id: Option<&StackId>,
    ) -> Result<Vec<WinHistory>, StackError>;
}

/// One stack of a seed file: the writable fields plus its current pot.
#[derive(Debug, Clone, Deserialize)]
struct SeedStack {
    #[serde(flatten)]
    payload: StackPayload,
    #[serde(default)]
    current_amount: i64,
}

/// Seed files are either a bare array of stacks or an object that also
/// carries win history.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SeedFile {
    Stacks(Vec<SeedStack>),
    Full {
        stacks: Vec<SeedStack>,
        #[serde(default)]
        history: Vec<WinHistory>,
    },
}

impl SeedFile {
    fn into_parts(self) -> (Vec<SeedStack>, Vec<WinHistory>) {
        match self {
            Self::Stacks(stacks) => (stacks, Vec::new()),
            Self::Full { stacks, history } => (stacks, history),
        }
    }
}

/// In-memory stack store.
///
/// Rows and win history are kept newest first. Identifiers are sequential
/// decimal strings.
pub struct MemoryStore {
    stacks: RwLock<Vec<Stack>>,
    history: RwLock<Vec<WinHistory>>,
    next_id: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            stacks: RwLock::new(Vec::new()),
            history: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a store holding one stack per payload, in the given order of creation.
    pub fn seeded(payloads: impl IntoIterator<Item = StackPayload>) -> Self {
        Self::from_seed(payloads.into_iter().map(|payload| SeedStack {
            payload,
            current_amount: 0,
        }))
    }

    fn from_seed(seed: impl IntoIterator<Item = SeedStack>) -> Self {
        let next_id = AtomicU64::new(1);
        let now = Utc::now();
        let mut stacks: Vec<Stack> = seed
            .into_iter()
            .map(|seed| {
                let mut stack = Stack::from_payload(sequential_id(&next_id), seed.payload, now);
                stack.current_amount = seed.current_amount;
                stack
            })
            .collect();
        stacks.reverse();
        Self {
            stacks: RwLock::new(stacks),
            history: RwLock::new(Vec::new()),
            next_id,
        }
    }

    /// Replace the win history. Entries may come in any order.
    pub fn with_history(mut self, mut history: Vec<WinHistory>) -> Self {
        history.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        self.history = RwLock::new(history);
        self
    }

    /// Load a seed file: a JSON array of stacks, or an object with `stacks`
    /// and `history`.
    pub fn from_seed_file(path: &Path) -> color_eyre::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let (stacks, history) = serde_json::from_str::<SeedFile>(&content)?.into_parts();
        for seed in &stacks {
            validate(&seed.payload)?;
            if seed.current_amount < 0 {
                return Err(eyre!(
                    "stack '{}' has a negative pot ({})",
                    seed.payload.name,
                    seed.current_amount
                ));
            }
        }
        debug!(
            "Seeding {} stacks and {} wins from {:?}",
            stacks.len(),
            history.len(),
            path
        );
        Ok(Self::from_seed(stacks).with_history(history))
    }

    fn allocate_id(&self) -> StackId {
        sequential_id(&self.next_id)
    }
}

fn sequential_id(counter: &AtomicU64) -> StackId {
    StackId::new(counter.fetch_add(1, Ordering::Relaxed).to_string())
}

#[async_trait]
impl StackStore for MemoryStore {
    async fn list_stacks(&self, enabled_only: bool) -> Result<Vec<Stack>, StackError> {
        let stacks = self.stacks.read().await;
        Ok(stacks
            .iter()
            .filter(|stack| !enabled_only || stack.enabled)
            .cloned()
            .collect())
    }

    async fn fetch_stack(&self, id: &StackId) -> Result<Stack, StackError> {
        let stacks = self.stacks.read().await;
        stacks
            .iter()
            .find(|stack| &stack.id == id)
            .cloned()
            .ok_or_else(|| StackError::NotFound(id.clone()))
    }

    async fn create_stack(&self, payload: StackPayload) -> Result<Stack, StackError> {
        validate(&payload)?;
        let stack = Stack::from_payload(self.allocate_id(), payload, Utc::now());
        self.stacks.write().await.insert(0, stack.clone());
        debug!("Created stack {}", stack.id);
        Ok(stack)
    }

    async fn update_stack(&self, id: &StackId, payload: StackPayload) -> Result<Stack, StackError> {
        validate(&payload)?;
        let mut stacks = self.stacks.write().await;
        let stack = stacks
            .iter_mut()
            .find(|stack| &stack.id == id)
            .ok_or_else(|| StackError::NotFound(id.clone()))?;
        stack.apply(payload);
        debug!("Updated stack {}", id);
        Ok(stack.clone())
    }

    async fn delete_stack(&self, id: &StackId) -> Result<(), StackError> {
        let mut stacks = self.stacks.write().await;
        let before = stacks.len();
        stacks.retain(|stack| &stack.id != id);
        if stacks.len() == before {
            return Err(StackError::NotFound(id.clone()));
        }
        debug!("Deleted stack {}", id);
        Ok(())
    }

    async fn list_win_history(
        &self,
        stack_id: Option<&StackId>,
    ) -> Result<Vec<WinHistory>, StackError> {
        let history = self.history.read().await;
        Ok(history
            .iter()
            .filter(|win| stack_id.is_none_or(|id| &win.stack_id == id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub(crate) fn win(id: &str, stack_id: &str, amount_won: i64, minute: u32) -> WinHistory {
        WinHistory {
            id: id.to_string(),
            stack_id: StackId::new(stack_id),
            bet_id: format!("bet-{id}"),
            amount_won,
            user_id: None,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap(),
        }
    }

    pub(crate) fn payload(name: &str, enabled: bool) -> StackPayload {
        StackPayload {
            name: name.to_string(),
            description: String::new(),
            bet_price: 1000,
            winning_probability: 0.45,
            fee_percentage: 2.5,
            enabled,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids_newest_first() {
        let store = MemoryStore::new();
        let first = store.create_stack(payload("Gold", true)).await.unwrap();
        let second = store.create_stack(payload("Silver", true)).await.unwrap();

        assert_eq!(first.id, StackId::new("1"));
        assert_eq!(second.id, StackId::new("2"));
        assert_eq!(first.current_amount, 0);

        let names: Vec<_> = store
            .list_stacks(false)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Silver", "Gold"]);
    }

    #[tokio::test]
    async fn test_seeded_store_lists_newest_first() {
        let store = MemoryStore::seeded(vec![payload("Gold", true), payload("Silver", false)]);
        let stacks = store.list_stacks(false).await.unwrap();
        assert_eq!(stacks[0].name, "Silver");
        assert_eq!(stacks[1].id, StackId::new("1"));

        let next = store.create_stack(payload("Bronze", true)).await.unwrap();
        assert_eq!(next.id, StackId::new("3"));
    }

    #[tokio::test]
    async fn test_list_enabled_only() {
        let store = MemoryStore::seeded(vec![payload("Gold", true), payload("Silver", false)]);
        let stacks = store.list_stacks(true).await.unwrap();
        assert_eq!(stacks.len(), 1);
        assert_eq!(stacks[0].name, "Gold");
    }

    #[tokio::test]
    async fn test_update_and_fetch() {
        let store = MemoryStore::seeded(vec![payload("Gold", true)]);
        let id = StackId::new("1");

        let updated = store
            .update_stack(&id, payload("Platinum", false))
            .await
            .unwrap();
        assert_eq!(updated.name, "Platinum");

        let fetched = store.fetch_stack(&id).await.unwrap();
        assert_eq!(fetched, updated);
    }

    #[tokio::test]
    async fn test_missing_stack_is_not_found() {
        let store = MemoryStore::new();
        let id = StackId::new("7");

        assert_eq!(
            store.fetch_stack(&id).await,
            Err(StackError::NotFound(id.clone()))
        );
        assert_eq!(
            store.update_stack(&id, payload("Gold", true)).await,
            Err(StackError::NotFound(id.clone()))
        );
        assert_eq!(
            store.delete_stack(&id).await,
            Err(StackError::NotFound(id))
        );
    }

    #[tokio::test]
    async fn test_invalid_payload_is_rejected() {
        let store = MemoryStore::new();
        let mut invalid = payload("Gold", true);
        invalid.winning_probability = 2.0;

        assert!(matches!(
            store.create_stack(invalid.clone()).await,
            Err(StackError::Validation(_))
        ));
        assert!(store.list_stacks(false).await.unwrap().is_empty());

        let created = store.create_stack(payload("Gold", true)).await.unwrap();
        assert!(matches!(
            store.update_stack(&created.id, invalid).await,
            Err(StackError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::seeded(vec![payload("Gold", true), payload("Silver", true)]);
        store.delete_stack(&StackId::new("1")).await.unwrap();

        let stacks = store.list_stacks(false).await.unwrap();
        assert_eq!(stacks.len(), 1);
        assert_eq!(stacks[0].name, "Silver");
    }

    #[test]
    fn test_seed_file() {
        let path = std::env::temp_dir().join(format!("stackadmin-seed-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"[{"name":"Gold","bet_price":1000,"winning_probability":0.45,"fee_percentage":2.5}]"#,
        )
        .unwrap();

        let store = MemoryStore::from_seed_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        let stacks = store.stacks.try_read().unwrap();
        assert_eq!(stacks.len(), 1);
        assert!(stacks[0].enabled);
    }

    #[tokio::test]
    async fn test_win_history_newest_first_and_scoped() {
        let store = MemoryStore::seeded(vec![payload("Gold", true), payload("Silver", true)])
            .with_history(vec![win("a", "1", 500, 1), win("b", "2", 900, 3), win("c", "1", 700, 2)]);

        let ids = |entries: Vec<WinHistory>| entries.into_iter().map(|w| w.id).collect::<Vec<_>>();
        assert_eq!(ids(store.list_win_history(None).await.unwrap()), vec!["b", "c", "a"]);
        assert_eq!(
            ids(store.list_win_history(Some(&StackId::new("1"))).await.unwrap()),
            vec!["c", "a"]
        );
        assert!(
            store
                .list_win_history(Some(&StackId::new("9")))
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_seed_file_with_pot_and_history() {
        let path = std::env::temp_dir().join(format!("stackadmin-history-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{
                "stacks": [
                    {"name":"Gold","bet_price":1000,"winning_probability":0.45,"fee_percentage":2.5,"current_amount":4200}
                ],
                "history": [
                    {"id":"w1","stack_id":"1","bet_id":"b1","amount_won":9000,"user_id":"alice","timestamp":"2024-05-01T12:00:00Z"}
                ]
            }"#,
        )
        .unwrap();

        let store = MemoryStore::from_seed_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        let stacks = store.list_stacks(false).await.unwrap();
        assert_eq!(stacks[0].current_amount, 4200);
        let history = store.list_win_history(Some(&stacks[0].id)).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].user_id.as_deref(), Some("alice"));

        // Editing keeps the pot
        let updated = store
            .update_stack(&stacks[0].id, payload("Gold", false))
            .await
            .unwrap();
        assert_eq!(updated.current_amount, 4200);
    }

    #[test]
    fn test_seed_file_rejects_negative_pot() {
        let path = std::env::temp_dir().join(format!("stackadmin-pot-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"[{"name":"Gold","bet_price":1000,"winning_probability":0.45,"fee_percentage":2.5,"current_amount":-1}]"#,
        )
        .unwrap();

        let result = MemoryStore::from_seed_file(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(result.is_err());
    }
}
