//! Application layer: the chat controller, message rendering, and the view
//! capability abstraction.
//!
//! The controller owns all mutable UI state (session token, pending image,
//! in-flight flag) and drives the transport and renderer; the view is a
//! trait so the whole flow is testable with a fake implementation.

pub mod controller;
pub mod render;
pub mod view;

pub use controller::{ChatController, UiState};
pub use view::{ChatView, MessageBody, QuizCard, RenderedMessage};
