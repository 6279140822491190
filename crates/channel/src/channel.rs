use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Slot is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Reader side of the slot.
pub struct CommandChannel {
    path: PathBuf,
    last_consumed: Option<String>,
}

impl CommandChannel {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            last_consumed: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Empties the slot and forgets the last consumed utterance.
    pub async fn reset(&mut self) -> Result<(), ChannelError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        fs::write(&self.path, b"").await?;
        self.last_consumed = None;
        tracing::info!("Command channel ready at {:?}", self.path);
        Ok(())
    }

    /// Returns the pending utterance at most once.
    ///
    /// Empty slots, unchanged content and I/O failures all yield `None`;
    /// failures are retried on the next call.
    pub async fn try_consume(&mut self) -> Option<String> {
        match self.poll().await {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!("Channel read skipped: {}", e);
                None
            }
        }
    }

    async fn poll(&mut self) -> Result<Option<String>, ChannelError> {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let text = String::from_utf8(raw)?;
        let content = text.trim();
        if content.is_empty() {
            return Ok(None);
        }

        if self.last_consumed.as_deref() == Some(content) {
            tracing::debug!("Duplicate utterance suppressed: {:?}", content);
            self.clear_best_effort().await;
            return Ok(None);
        }

        let content = content.to_string();
        self.last_consumed = Some(content.clone());
        self.clear_best_effort().await;
        Ok(Some(content))
    }

    // A failed clear is harmless: the content now matches `last_consumed` and
    // is suppressed on the next poll.
    async fn clear_best_effort(&self) {
        let result = fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.path)
            .await;
        if let Err(e) = result {
            if e.kind() != ErrorKind::NotFound {
                tracing::debug!("Channel clear failed: {}", e);
            }
        }
    }
}
