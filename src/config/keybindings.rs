use crossterm::event::KeyCode;
use serde::{Deserialize, Serialize};

use crate::config::key::{Key, KeyBinding};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalKeybindings {
    pub quit: KeyBinding,
    pub help: KeyBinding,
    pub back: KeyBinding,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationKeybindings {
    pub up: KeyBinding,
    pub down: KeyBinding,
    pub page_up: KeyBinding,
    pub page_down: KeyBinding,
    pub home: KeyBinding,
    pub end: KeyBinding,
    pub select: KeyBinding,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchKeybindings {
    pub toggle: KeyBinding,
    pub exit: KeyBinding,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StackListKeybindings {
    pub new: KeyBinding,
    pub edit: KeyBinding,
    pub delete: KeyBinding,
    pub reload: KeyBinding,
    pub toggle_filter: KeyBinding,
    pub dismiss_banner: KeyBinding,
    pub history: KeyBinding,
    pub all_history: KeyBinding,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormKeybindings {
    pub submit: KeyBinding,
    pub cancel: KeyBinding,
    pub next_field: KeyBinding,
    pub prev_field: KeyBinding,
    pub toggle: KeyBinding,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogKeybindings {
    pub confirm: KeyBinding,
    pub cancel: KeyBinding,
}

/// All keybindings, one table per section in `config.toml`.
///
/// Sections and keys left out of the file keep their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct KeybindingsConfig {
    pub global: GlobalKeybindings,
    pub navigation: NavigationKeybindings,
    pub search: SearchKeybindings,
    pub stacks: StackListKeybindings,
    pub form: FormKeybindings,
    pub dialog: DialogKeybindings,
}

impl Default for GlobalKeybindings {
    fn default() -> Self {
        Self {
            quit: Key::new(KeyCode::Char('q')).into(),
            help: Key::new(KeyCode::Char('?')).into(),
            back: Key::new(KeyCode::Esc).into(),
        }
    }
}

impl Default for NavigationKeybindings {
    fn default() -> Self {
        Self {
            up: vec![Key::new(KeyCode::Char('k')), Key::new(KeyCode::Up)].into(),
            down: vec![Key::new(KeyCode::Char('j')), Key::new(KeyCode::Down)].into(),
            page_up: Key::new(KeyCode::PageUp).into(),
            page_down: Key::new(KeyCode::PageDown).into(),
            home: vec![Key::new(KeyCode::Char('g')), Key::new(KeyCode::Home)].into(),
            end: vec![Key::new(KeyCode::Char('G')), Key::new(KeyCode::End)].into(),
            select: Key::new(KeyCode::Enter).into(),
        }
    }
}

impl Default for SearchKeybindings {
    fn default() -> Self {
        Self {
            toggle: Key::new(KeyCode::Char('/')).into(),
            exit: Key::new(KeyCode::Esc).into(),
        }
    }
}

impl Default for StackListKeybindings {
    fn default() -> Self {
        Self {
            new: Key::new(KeyCode::Char('n')).into(),
            edit: Key::new(KeyCode::Char('e')).into(),
            delete: vec![Key::new(KeyCode::Char('d')), Key::new(KeyCode::Delete)].into(),
            reload: Key::new(KeyCode::Char('r')).into(),
            toggle_filter: Key::new(KeyCode::Char('f')).into(),
            dismiss_banner: Key::new(KeyCode::Char('x')).into(),
            history: Key::new(KeyCode::Char('h')).into(),
            all_history: Key::new(KeyCode::Char('H')).into(),
        }
    }
}

impl Default for FormKeybindings {
    fn default() -> Self {
        Self {
            submit: Key::new(KeyCode::Enter).into(),
            cancel: Key::new(KeyCode::Esc).into(),
            next_field: vec![Key::new(KeyCode::Tab), Key::new(KeyCode::Down)].into(),
            prev_field: vec![
                Key::with_shift(KeyCode::BackTab),
                Key::new(KeyCode::BackTab),
                Key::new(KeyCode::Up),
            ]
            .into(),
            toggle: Key::new(KeyCode::Char(' ')).into(),
        }
    }
}

impl Default for DialogKeybindings {
    fn default() -> Self {
        Self {
            confirm: vec![
                Key::new(KeyCode::Char('y')),
                Key::new(KeyCode::Char('Y')),
                Key::new(KeyCode::Enter),
            ]
            .into(),
            cancel: vec![
                Key::new(KeyCode::Char('n')),
                Key::new(KeyCode::Char('N')),
                Key::new(KeyCode::Esc),
            ]
            .into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: KeybindingsConfig = toml::from_str(
            r#"
            [stacks]
            new = "a"
            delete = ["x", "Delete"]
            "#,
        )
        .unwrap();

        assert_eq!(config.stacks.new, KeyBinding::single(Key::new(KeyCode::Char('a'))));
        assert_eq!(config.stacks.delete.display(), "x/Delete");
        assert_eq!(config.stacks.reload, StackListKeybindings::default().reload);
        assert_eq!(config.global.quit, GlobalKeybindings::default().quit);
    }
}
