//! Messages for the stack admin panel.
//!
//! User intents and async store results flow through the same queue and are
//! processed in order by the panel's `update()`.

use std::fmt;

use crate::stack::error::StackError;
use crate::stack::model::{Stack, StackId, StackPayload, WinHistory};

/// A store call the panel wants performed.
#[derive(Debug, Clone, PartialEq)]
pub enum StackRequest {
    /// `generation` tags the result so only the latest listing is applied.
    List { enabled_only: bool, generation: u64 },
    Fetch(StackId),
    Create(StackPayload),
    Update(StackId, StackPayload),
    Delete(StackId),
    /// Win history of one stack, or of all stacks when `None`.
    History(Option<StackId>),
}

impl StackRequest {
    pub const fn action(&self) -> StackAction {
        match self {
            Self::List { .. } => StackAction::List,
            Self::Fetch(_) => StackAction::Fetch,
            Self::Create(_) => StackAction::Create,
            Self::Update(..) => StackAction::Update,
            Self::Delete(_) => StackAction::Delete,
            Self::History(_) => StackAction::History,
        }
    }
}

/// Which store call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackAction {
    List,
    Fetch,
    Create,
    Update,
    Delete,
    History,
}

impl fmt::Display for StackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::List => "load stacks",
            Self::Fetch => "load stack",
            Self::Create => "create stack",
            Self::Update => "update stack",
            Self::Delete => "delete stack",
            Self::History => "load win history",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StackMsg {
    // === Lifecycle ===
    Initialize,

    // === List ===
    Reload,
    ToggleEnabledFilter,
    DismissBanner,

    // === Form modal ===
    OpenCreate,
    OpenEdit(StackId),
    CloseModal,
    Submit,

    // === Delete confirmation ===
    RequestDelete(StackId),
    DeleteConfirmed,
    DeleteCancelled,

    // === Win history ===
    OpenHistory(Option<StackId>),
    CloseHistory,

    // === Store results ===
    Loaded {
        generation: u64,
        stacks: Vec<Stack>,
    },
    Fetched(Stack),
    Created(Stack),
    Updated(Stack),
    Deleted(StackId),
    HistoryLoaded {
        scope: Option<StackId>,
        entries: Vec<WinHistory>,
    },
    Failed {
        action: StackAction,
        error: StackError,
    },
}
