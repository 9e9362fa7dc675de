//! Commands for stack store operations.
//!
//! Each command performs one store call and sends the outcome back through
//! the panel's message channel. Store failures are reported as
//! [`StackMsg::Failed`], never as command errors.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

use crate::commands::Command;
use crate::stack::error::StackError;
use crate::stack::message::{StackAction, StackMsg, StackRequest};
use crate::stack::model::{StackId, StackPayload};
use crate::stack::store::StackStore;

fn report(
    tx: &UnboundedSender<StackMsg>,
    action: StackAction,
    result: Result<StackMsg, StackError>,
) {
    let msg = result.unwrap_or_else(|error| StackMsg::Failed { action, error });
    // The panel may already be gone on shutdown
    let _ = tx.send(msg);
}

/// Build the command that performs `request`.
pub fn for_request(
    request: StackRequest,
    store: Arc<dyn StackStore>,
    tx: UnboundedSender<StackMsg>,
) -> Box<dyn Command> {
    match request {
        StackRequest::List {
            enabled_only,
            generation,
        } => Box::new(ListStacksCmd {
            store,
            enabled_only,
            generation,
            tx,
        }),
        StackRequest::Fetch(id) => Box::new(FetchStackCmd { store, id, tx }),
        StackRequest::Create(payload) => Box::new(CreateStackCmd { store, payload, tx }),
        StackRequest::Update(id, payload) => Box::new(UpdateStackCmd {
            store,
            id,
            payload,
            tx,
        }),
        StackRequest::Delete(id) => Box::new(DeleteStackCmd { store, id, tx }),
        StackRequest::History(scope) => Box::new(ListWinHistoryCmd { store, scope, tx }),
    }
}

/// Load the stack list.
pub struct ListStacksCmd {
    store: Arc<dyn StackStore>,
    enabled_only: bool,
    generation: u64,
    tx: UnboundedSender<StackMsg>,
}

#[async_trait]
impl Command for ListStacksCmd {
    fn name(&self) -> String {
        if self.enabled_only {
            "Loading enabled stacks".to_string()
        } else {
            "Loading stacks".to_string()
        }
    }

    async fn execute(self: Box<Self>) -> color_eyre::Result<()> {
        let result = self.store.list_stacks(self.enabled_only).await;
        let generation = self.generation;
        report(
            &self.tx,
            StackAction::List,
            result.map(|stacks| StackMsg::Loaded { generation, stacks }),
        );
        Ok(())
    }
}

/// Load one stack for the edit form.
pub struct FetchStackCmd {
    store: Arc<dyn StackStore>,
    id: StackId,
    tx: UnboundedSender<StackMsg>,
}

#[async_trait]
impl Command for FetchStackCmd {
    fn name(&self) -> String {
        format!("Loading stack {}", self.id)
    }

    async fn execute(self: Box<Self>) -> color_eyre::Result<()> {
        let result = self.store.fetch_stack(&self.id).await;
        report(&self.tx, StackAction::Fetch, result.map(StackMsg::Fetched));
        Ok(())
    }
}

pub struct CreateStackCmd {
    store: Arc<dyn StackStore>,
    payload: StackPayload,
    tx: UnboundedSender<StackMsg>,
}

#[async_trait]
impl Command for CreateStackCmd {
    fn name(&self) -> String {
        format!("Creating stack '{}'", self.payload.name)
    }

    async fn execute(self: Box<Self>) -> color_eyre::Result<()> {
        let result = self.store.create_stack(self.payload).await;
        report(&self.tx, StackAction::Create, result.map(StackMsg::Created));
        Ok(())
    }
}

pub struct UpdateStackCmd {
    store: Arc<dyn StackStore>,
    id: StackId,
    payload: StackPayload,
    tx: UnboundedSender<StackMsg>,
}

#[async_trait]
impl Command for UpdateStackCmd {
    fn name(&self) -> String {
        format!("Updating stack {}", self.id)
    }

    async fn execute(self: Box<Self>) -> color_eyre::Result<()> {
        let result = self.store.update_stack(&self.id, self.payload).await;
        report(&self.tx, StackAction::Update, result.map(StackMsg::Updated));
        Ok(())
    }
}

pub struct DeleteStackCmd {
    store: Arc<dyn StackStore>,
    id: StackId,
    tx: UnboundedSender<StackMsg>,
}

#[async_trait]
impl Command for DeleteStackCmd {
    fn name(&self) -> String {
        format!("Deleting stack {}", self.id)
    }

    async fn execute(self: Box<Self>) -> color_eyre::Result<()> {
        let Self { store, id, tx } = *self;
        let result = store.delete_stack(&id).await;
        report(&tx, StackAction::Delete, result.map(|()| StackMsg::Deleted(id)));
        Ok(())
    }
}

/// Load win history for one stack or for all of them.
pub struct ListWinHistoryCmd {
    store: Arc<dyn StackStore>,
    scope: Option<StackId>,
    tx: UnboundedSender<StackMsg>,
}

#[async_trait]
impl Command for ListWinHistoryCmd {
    fn name(&self) -> String {
        self.scope.as_ref().map_or_else(
            || "Loading win history".to_string(),
            |id| format!("Loading win history of stack {id}"),
        )
    }

    async fn execute(self: Box<Self>) -> color_eyre::Result<()> {
        let Self { store, scope, tx } = *self;
        let result = store.list_win_history(scope.as_ref()).await;
        report(
            &tx,
            StackAction::History,
            result.map(|entries| StackMsg::HistoryLoaded { scope, entries }),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::store::MemoryStore;
    use crate::stack::store::tests::{payload, win};
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_create_reports_created_stack() {
        let store: Arc<dyn StackStore> = Arc::new(MemoryStore::new());
        let (tx, mut rx) = mpsc::unbounded_channel();

        let cmd = for_request(StackRequest::Create(payload("Gold", true)), store, tx);
        assert_eq!(cmd.name(), "Creating stack 'Gold'");
        cmd.execute().await.unwrap();

        match rx.recv().await {
            Some(StackMsg::Created(stack)) => assert_eq!(stack.name, "Gold"),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_store_failure_is_reported_not_raised() {
        let store: Arc<dyn StackStore> = Arc::new(MemoryStore::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = StackId::new("7");

        for_request(StackRequest::Delete(id.clone()), store, tx)
            .execute()
            .await
            .unwrap();

        match rx.recv().await {
            Some(StackMsg::Failed { action, error }) => {
                assert_eq!(action, StackAction::Delete);
                assert_eq!(error, StackError::NotFound(id));
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_reports_its_generation() {
        let store: Arc<dyn StackStore> = Arc::new(MemoryStore::seeded([payload("Gold", true)]));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let request = StackRequest::List {
            enabled_only: false,
            generation: 4,
        };
        for_request(request, store, tx).execute().await.unwrap();

        match rx.recv().await {
            Some(StackMsg::Loaded { generation, stacks }) => {
                assert_eq!(generation, 4);
                assert_eq!(stacks.len(), 1);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_delete_reports_deleted_id() {
        let store: Arc<dyn StackStore> = Arc::new(MemoryStore::seeded([payload("Gold", true)]));
        let (tx, mut rx) = mpsc::unbounded_channel();

        for_request(StackRequest::Delete(StackId::new("1")), store, tx)
            .execute()
            .await
            .unwrap();

        assert_eq!(rx.recv().await, Some(StackMsg::Deleted(StackId::new("1"))));
    }

    #[tokio::test]
    async fn test_history_reports_scope() {
        let store: Arc<dyn StackStore> = Arc::new(
            MemoryStore::seeded([payload("Gold", true)]).with_history(vec![win("w1", "1", 900, 0)]),
        );
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scope = Some(StackId::new("1"));

        let cmd = for_request(StackRequest::History(scope.clone()), store, tx);
        assert_eq!(cmd.name(), "Loading win history of stack 1");
        cmd.execute().await.unwrap();

        match rx.recv().await {
            Some(StackMsg::HistoryLoaded { scope: got, entries }) => {
                assert_eq!(got, scope);
                assert_eq!(entries[0].amount_won, 900);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }
}
