use crate::stack::model::StackId;

/// What the shared stack form is currently used for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalMode {
    Create,
    Edit(StackId),
}

/// Visibility of the stack form modal.
///
/// The target identifier only exists while editing, so create-vs-update
/// routing can never disagree with the visible mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ModalState {
    #[default]
    Hidden,
    Visible { mode: ModalMode },
}

impl ModalState {
    pub const fn create() -> Self {
        Self::Visible {
            mode: ModalMode::Create,
        }
    }

    pub const fn edit(id: StackId) -> Self {
        Self::Visible {
            mode: ModalMode::Edit(id),
        }
    }

    pub const fn is_visible(&self) -> bool {
        matches!(self, Self::Visible { .. })
    }

    pub const fn mode(&self) -> Option<&ModalMode> {
        match self {
            Self::Hidden => None,
            Self::Visible { mode } => Some(mode),
        }
    }

    /// Identifier of the stack being edited, if any.
    pub const fn target_id(&self) -> Option<&StackId> {
        match self {
            Self::Visible {
                mode: ModalMode::Edit(id),
            } => Some(id),
            _ => None,
        }
    }

    pub const fn title(&self) -> &'static str {
        match self {
            Self::Visible {
                mode: ModalMode::Edit(_),
            } => "Edit Stack",
            _ => "Create New Stack",
        }
    }

    pub fn hide(&mut self) {
        *self = Self::Hidden;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_hidden() {
        let state = ModalState::default();
        assert!(!state.is_visible());
        assert!(state.mode().is_none());
        assert!(state.target_id().is_none());
    }

    #[test]
    fn test_target_only_in_edit_mode() {
        assert!(ModalState::create().target_id().is_none());
        assert_eq!(
            ModalState::edit(StackId::new("42")).target_id(),
            Some(&StackId::new("42"))
        );
    }

    #[test]
    fn test_titles() {
        assert_eq!(ModalState::create().title(), "Create New Stack");
        assert_eq!(ModalState::edit(StackId::new("1")).title(), "Edit Stack");
    }

    #[test]
    fn test_hide_is_idempotent() {
        let mut state = ModalState::edit(StackId::new("1"));
        state.hide();
        state.hide();
        assert_eq!(state, ModalState::Hidden);
    }
}
