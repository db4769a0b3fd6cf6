//! External confirmation for destructive bulk operations.

use async_trait::async_trait;

/// Yes/no decision taken outside the pipeline, e.g. a dialog.
///
/// The pipeline asks before a bulk clear and does nothing until an answer
/// arrives. Implementations may take as long as they need; the pipeline keeps
/// processing other events meanwhile.
#[async_trait]
pub trait ConfirmationPrompt: Send + Sync {
    /// Asks whether `count` records should be deleted without undo.
    async fn confirm_clear_all(&self, count: usize) -> bool;
}

/// Prompt that always gives the same answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticConfirmation(pub bool);

#[async_trait]
impl ConfirmationPrompt for StaticConfirmation {
    async fn confirm_clear_all(&self, count: usize) -> bool {
        tracing::debug!(count = count, answer = self.0, "static confirmation");
        self.0
    }
}
