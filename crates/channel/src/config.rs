use crate::channel::CommandChannel;
use crate::writer::{ChannelWriter, PublishMode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_path() -> PathBuf {
    PathBuf::from("voice_listener.txt")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Slot file. The recognizer writes the same path relative to its working directory.
    #[serde(default = "default_path")]
    pub path: PathBuf,
    #[serde(default)]
    pub publish_mode: PublishMode,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            publish_mode: PublishMode::default(),
        }
    }
}

impl ChannelConfig {
    pub fn reader(&self) -> CommandChannel {
        CommandChannel::new(&self.path)
    }

    pub fn writer(&self) -> ChannelWriter {
        ChannelWriter::new(&self.path, self.publish_mode)
    }
}
