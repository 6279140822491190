//! Single-slot file channel carrying recognized utterances from the
//! recognizer process to the router.
//!
//! The slot holds at most one utterance. Writers overwrite it; the reader
//! consumes and truncates it. There is no queue: two utterances written within
//! one poll interval collapse to the later one, and the read-then-truncate pair
//! is not atomic against a concurrent writer. Both are accepted tradeoffs of the
//! file transport; `PublishMode::Rename` narrows the partial-read window for
//! writers that can use it.

pub mod channel;
pub mod config;
pub mod writer;

pub use channel::{ChannelError, CommandChannel};
pub use config::ChannelConfig;
pub use writer::{ChannelWriter, PublishMode};
