//! 输入防抖
//!
//! Coalesces bursts of input: a value is emitted only after `quiet` has
//! passed with no newer value. Intermediate values are dropped.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::trace;

pub struct Debouncer<T> {
    input: Option<mpsc::UnboundedSender<T>>,
    worker: JoinHandle<()>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Spawn the debounce task. Settled values arrive on the returned receiver.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(quiet: Duration) -> (Self, mpsc::UnboundedReceiver<T>) {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (output_tx, output_rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run(quiet, input_rx, output_tx));
        (Self { input: Some(input_tx), worker }, output_rx)
    }

    /// Submit a new value, superseding any pending one.
    ///
    /// Returns `false` once the debouncer has been cancelled.
    pub fn push(&self, value: T) -> bool {
        match &self.input {
            Some(input) => input.send(value).is_ok(),
            None => false,
        }
    }

    /// Drop any pending value without emitting it and stop the task.
    pub fn cancel(&mut self) {
        self.input.take();
        self.worker.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.input.is_none() || self.worker.is_finished()
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

async fn run<T>(
    quiet: Duration,
    mut input: mpsc::UnboundedReceiver<T>,
    output: mpsc::UnboundedSender<T>,
) {
    let mut pending: Option<T> = None;
    loop {
        match pending.take() {
            None => match input.recv().await {
                Some(value) => pending = Some(value),
                None => break,
            },
            Some(value) => {
                tokio::select! {
                    next = input.recv() => match next {
                        Some(newer) => pending = Some(newer),
                        // teardown: pending value is discarded
                        None => break,
                    },
                    _ = tokio::time::sleep(quiet) => {
                        trace!("debounce window elapsed, emitting");
                        if output.send(value).is_err() {
                            break;
                        }
                    }
                }
            }
        }
    }
}
