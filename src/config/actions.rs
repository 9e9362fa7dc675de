#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalAction {
    Quit,
    Help,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
    Select,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchAction {
    Toggle,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StacksAction {
    New,
    Edit,
    Delete,
    Reload,
    ToggleFilter,
    DismissBanner,
    History,
    AllHistory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    Submit,
    Cancel,
    NextField,
    PrevField,
    Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogAction {
    Confirm,
    Cancel,
}
