use std::sync::Arc;

use crossterm::event::KeyEvent;

use crate::config::actions::{
    DialogAction, FormAction, GlobalAction, NavAction, SearchAction, StacksAction,
};
use crate::config::key::KeyBinding;
use crate::config::keybindings::KeybindingsConfig;

/// Maps key events to actions, and actions to their display strings.
pub struct KeyResolver {
    pub keybindings: Arc<KeybindingsConfig>,
}

impl KeyResolver {
    pub const fn new(keybindings: Arc<KeybindingsConfig>) -> Self {
        Self { keybindings }
    }

    fn global(&self, action: GlobalAction) -> &KeyBinding {
        let kb = &self.keybindings.global;
        match action {
            GlobalAction::Quit => &kb.quit,
            GlobalAction::Help => &kb.help,
            GlobalAction::Back => &kb.back,
        }
    }

    fn nav(&self, action: NavAction) -> &KeyBinding {
        let kb = &self.keybindings.navigation;
        match action {
            NavAction::Up => &kb.up,
            NavAction::Down => &kb.down,
            NavAction::PageUp => &kb.page_up,
            NavAction::PageDown => &kb.page_down,
            NavAction::Home => &kb.home,
            NavAction::End => &kb.end,
            NavAction::Select => &kb.select,
        }
    }

    fn search(&self, action: SearchAction) -> &KeyBinding {
        let kb = &self.keybindings.search;
        match action {
            SearchAction::Toggle => &kb.toggle,
            SearchAction::Exit => &kb.exit,
        }
    }

    fn stacks(&self, action: StacksAction) -> &KeyBinding {
        let kb = &self.keybindings.stacks;
        match action {
            StacksAction::New => &kb.new,
            StacksAction::Edit => &kb.edit,
            StacksAction::Delete => &kb.delete,
            StacksAction::Reload => &kb.reload,
            StacksAction::ToggleFilter => &kb.toggle_filter,
            StacksAction::DismissBanner => &kb.dismiss_banner,
            StacksAction::History => &kb.history,
            StacksAction::AllHistory => &kb.all_history,
        }
    }

    fn form(&self, action: FormAction) -> &KeyBinding {
        let kb = &self.keybindings.form;
        match action {
            FormAction::Submit => &kb.submit,
            FormAction::Cancel => &kb.cancel,
            FormAction::NextField => &kb.next_field,
            FormAction::PrevField => &kb.prev_field,
            FormAction::Toggle => &kb.toggle,
        }
    }

    fn dialog(&self, action: DialogAction) -> &KeyBinding {
        let kb = &self.keybindings.dialog;
        match action {
            DialogAction::Confirm => &kb.confirm,
            DialogAction::Cancel => &kb.cancel,
        }
    }

    pub fn matches_global(&self, event: &KeyEvent, action: GlobalAction) -> bool {
        self.global(action).matches(event)
    }

    pub fn display_global(&self, action: GlobalAction) -> String {
        self.global(action).display()
    }

    pub fn matches_nav(&self, event: &KeyEvent, action: NavAction) -> bool {
        self.nav(action).matches(event)
    }

    pub fn display_nav(&self, action: NavAction) -> String {
        self.nav(action).display()
    }

    pub fn matches_search(&self, event: &KeyEvent, action: SearchAction) -> bool {
        self.search(action).matches(event)
    }

    pub fn display_search(&self, action: SearchAction) -> String {
        self.search(action).display()
    }

    pub fn matches_stacks(&self, event: &KeyEvent, action: StacksAction) -> bool {
        self.stacks(action).matches(event)
    }

    pub fn display_stacks(&self, action: StacksAction) -> String {
        self.stacks(action).display()
    }

    pub fn matches_form(&self, event: &KeyEvent, action: FormAction) -> bool {
        self.form(action).matches(event)
    }

    pub fn display_form(&self, action: FormAction) -> String {
        self.form(action).display()
    }

    pub fn matches_dialog(&self, event: &KeyEvent, action: DialogAction) -> bool {
        self.dialog(action).matches(event)
    }

    pub fn display_dialog(&self, action: DialogAction) -> String {
        self.dialog(action).display()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};

    #[test]
    fn test_default_stack_keys() {
        let resolver = KeyResolver::new(Arc::new(KeybindingsConfig::default()));
        let key = |c| KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE);

        assert!(resolver.matches_stacks(&key('n'), StacksAction::New));
        assert!(resolver.matches_stacks(&key('d'), StacksAction::Delete));
        assert!(!resolver.matches_stacks(&key('n'), StacksAction::Delete));
        assert_eq!(resolver.display_stacks(StacksAction::Delete), "d/Delete");
        assert!(resolver.matches_stacks(&key('h'), StacksAction::History));
        assert!(!resolver.matches_stacks(&key('h'), StacksAction::AllHistory));
        assert!(resolver.matches_stacks(
            &KeyEvent::new(KeyCode::Char('H'), KeyModifiers::SHIFT),
            StacksAction::AllHistory
        ));
        assert_eq!(resolver.display_form(FormAction::Toggle), "Space");
    }

    #[test]
    fn test_backtab_with_or_without_shift() {
        let resolver = KeyResolver::new(Arc::new(KeybindingsConfig::default()));
        for modifiers in [KeyModifiers::NONE, KeyModifiers::SHIFT] {
            let event = KeyEvent::new(KeyCode::BackTab, modifiers);
            assert!(resolver.matches_form(&event, FormAction::PrevField));
        }
    }
}
