//! Conversation orchestration.
//!
//! Composes the identity context, session registry, message timelines, and
//! speech input into the single surface the presentation layer talks to:
//! send a message, manage sessions, toggle the sidebar, start and stop
//! recording, and observe the resulting state.

pub mod error;
pub mod orchestrator;
pub mod sidebar;

pub use error::ChatError;
pub use orchestrator::ChatOrchestrator;
pub use sidebar::SidebarState;
