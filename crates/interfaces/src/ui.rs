//! UI execution contexts.
//!
//! `UiThread` owns a dedicated OS thread that plays the role of the host's UI
//! event loop: jobs are queued from any task and executed one at a time, in
//! submission order. `InlineUi` runs jobs on the caller and exists for hosts
//! that already call in from their UI context, and for tests.

use crate::error::ActionError;
use crate::traits::{UiDispatcher, UiJob};
use async_trait::async_trait;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread::JoinHandle;
use tokio::sync::{mpsc, oneshot};

struct Envelope {
    job: UiJob,
    reply: oneshot::Sender<Result<(), ActionError>>,
}

pub struct UiThread {
    sender: Option<mpsc::UnboundedSender<Envelope>>,
    handle: Option<JoinHandle<()>>,
}

impl UiThread {
    pub fn spawn(name: &str) -> std::io::Result<Self> {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Envelope>();

        let handle = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                while let Some(envelope) = receiver.blocking_recv() {
                    let result = run_isolated(envelope.job);
                    // The submitter may have stopped waiting.
                    let _ = envelope.reply.send(result);
                }
                tracing::debug!("UI thread drained, exiting");
            })?;

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    /// Stops accepting jobs and waits for queued ones to finish.
    pub fn shutdown(mut self) {
        self.close();
    }

    fn close(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("UI thread terminated abnormally");
            }
        }
    }
}

impl Drop for UiThread {
    fn drop(&mut self) {
        self.close();
    }
}

#[async_trait]
impl UiDispatcher for UiThread {
    async fn run(&self, job: UiJob) -> Result<(), ActionError> {
        let sender = self.sender.as_ref().ok_or(ActionError::UiClosed)?;
        let (reply, done) = oneshot::channel();
        sender
            .send(Envelope { job, reply })
            .map_err(|_| ActionError::UiClosed)?;
        done.await.map_err(|_| ActionError::UiClosed)?
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct InlineUi;

#[async_trait]
impl UiDispatcher for InlineUi {
    async fn run(&self, job: UiJob) -> Result<(), ActionError> {
        run_isolated(job)
    }
}

fn run_isolated(job: UiJob) -> Result<(), ActionError> {
    match catch_unwind(AssertUnwindSafe(job)) {
        Ok(result) => result,
        Err(payload) => Err(ActionError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_inline_runs_job() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let result = InlineUi
            .run(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }))
            .await;
        assert!(result.is_ok());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_inline_captures_panic() {
        let result = InlineUi.run(Box::new(|| -> Result<(), ActionError> { panic!("boom") })).await;
        assert_eq!(result, Err(ActionError::Panicked("boom".to_string())));
    }

    #[tokio::test]
    async fn test_ui_thread_runs_on_named_thread() {
        let ui = UiThread::spawn("test-ui").unwrap();
        let seen = Arc::new(Mutex::new(None));
        let slot = seen.clone();
        ui.run(Box::new(move || {
            *slot.lock().unwrap() = std::thread::current().name().map(str::to_string);
            Ok(())
        }))
        .await
        .unwrap();
        assert_eq!(seen.lock().unwrap().as_deref(), Some("test-ui"));
        ui.shutdown();
    }

    #[tokio::test]
    async fn test_ui_thread_propagates_failure_and_survives_panic() {
        let ui = UiThread::spawn("test-ui-faults").unwrap();

        let failed = ui.run(Box::new(|| Err(ActionError::failed("nope")))).await;
        assert_eq!(failed, Err(ActionError::Failed("nope".to_string())));

        let panicked = ui.run(Box::new(|| -> Result<(), ActionError> { panic!("bad action") })).await;
        assert!(matches!(panicked, Err(ActionError::Panicked(_))));

        // Still serving after a panicking job.
        assert!(ui.run(Box::new(|| Ok(()))).await.is_ok());
        ui.shutdown();
    }
}
