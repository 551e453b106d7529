pub mod config;
pub mod error;
pub mod events;
pub mod identity;
pub mod types;

pub use config::WayfarerConfig;
pub use error::{Result, WayfarerError};
pub use events::{DomainEvent, Notice, NoticeKind};
pub use identity::IdentityContext;
pub use types::*;
