//! Per-session message timelines.
//!
//! Each session's conversation is an append-only, ordered sequence of
//! turns held in memory. User turns are appended optimistically before any
//! network round-trip; assistant replies expand into one text turn plus one
//! turn per place recommendation, inserted atomically so concurrent
//! appends never interleave inside a reply.

pub mod reply;
pub mod store;

pub use reply::{parse_reply, ReplyPayload, FALLBACK_REPLY};
pub use store::{TimelineStore, WaitingGuard};
