//! Async commands for side effects.
//!
//! Commands represent async operations that run outside the main event loop.
//! Services return commands, and the App spawns them on tokio.

use async_trait::async_trait;
use color_eyre::Result;

/// Async command that performs a side effect.
///
/// Commands report their results back to the service through a channel.
/// An `Err` means the command itself broke, and is surfaced by the App.
#[async_trait]
pub trait Command: Send + 'static {
    /// Human-readable name for logs and failure toasts.
    fn name(&self) -> String;

    async fn execute(self: Box<Self>) -> Result<()>;
}
