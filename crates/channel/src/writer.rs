use crate::channel::ChannelError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishMode {
    /// Truncate the slot and write in place, as the recognizer does.
    #[default]
    Truncate,
    /// Write a sibling temp file and rename it over the slot.
    Rename,
}

/// Writer side of the slot.
///
/// `publish` returns only after the bytes are flushed and synced, so a later
/// read never observes a partial write from this writer.
pub struct ChannelWriter {
    path: PathBuf,
    mode: PublishMode,
}

impl ChannelWriter {
    pub fn new<P: AsRef<Path>>(path: P, mode: PublishMode) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            mode,
        }
    }

    pub async fn publish(&self, text: &str) -> Result<(), ChannelError> {
        match self.mode {
            PublishMode::Truncate => write_synced(&self.path, text).await?,
            PublishMode::Rename => {
                let temp_path = self.path.with_extension("tmp");
                write_synced(&temp_path, text).await?;
                fs::rename(&temp_path, &self.path).await?;
            }
        }
        tracing::debug!("Published utterance: {:?}", text);
        Ok(())
    }
}

async fn write_synced(path: &Path, text: &str) -> Result<(), ChannelError> {
    let mut file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .await?;
    file.write_all(text.as_bytes()).await?;
    file.flush().await?;
    file.sync_all().await?;
    Ok(())
}
