//! Restart-on-input debouncer for UI-originated writes.
//!
//! Uses an mpsc channel + timeout loop:
//! 1. `push(value)` sends a non-blocking message
//! 2. The background task waits for the first value, then keeps replacing it
//!    with newer ones until `delay` passes with no input
//! 3. Only the last value is committed; the loop then waits for the next burst
//!
//! The task ends when the `Debouncer` is dropped. A value still inside its
//! quiet window at that point is discarded.

use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;

/// Quiet period for seed-query text
pub const SEED_QUERY_DEBOUNCE: Duration = Duration::from_millis(300);

/// Quiet period for freeform inputs such as search text
pub const FREEFORM_INPUT_DEBOUNCE: Duration = Duration::from_millis(200);

pub struct Debouncer<T> {
    input_tx: mpsc::UnboundedSender<T>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Spawn the debounce loop; `commit` runs once per burst with the burst's last value
    pub fn new<F, Fut>(delay: Duration, commit: F) -> Self
    where
        F: FnMut(T) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel::<T>();
        tokio::spawn(Self::run_loop(rx, delay, commit));
        Self { input_tx: tx }
    }

    /// Non-blocking; cancels the pending commit and restarts the quiet period
    pub fn push(&self, value: T) {
        let _ = self.input_tx.send(value);
    }

    async fn run_loop<F, Fut>(mut rx: mpsc::UnboundedReceiver<T>, delay: Duration, mut commit: F)
    where
        F: FnMut(T) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        loop {
            let mut last = match rx.recv().await {
                Some(value) => value,
                None => break,
            };

            loop {
                match tokio::time::timeout(delay, rx.recv()).await {
                    Ok(Some(value)) => last = value,
                    Ok(None) => return,
                    Err(_) => break,
                }
            }

            commit(last).await;
        }
    }
}
