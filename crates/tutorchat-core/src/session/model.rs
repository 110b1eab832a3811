//! Conversation mode.

use serde::{Deserialize, Serialize};

/// Which endpoint family the client talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatMode {
    /// Stateless single-turn chat against `/chat`.
    #[default]
    Chat,
    /// Session-oriented dialogue against `/start_dialogue`,
    /// `/continue_dialogue` and `/end_dialogue`.
    Dialogue,
}
