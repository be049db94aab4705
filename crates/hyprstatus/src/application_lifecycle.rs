//! Module concerned with handling the global application lifecycle.
//! Currently, this only means handling application exit: [`send_exit`] notifies every
//! receiver obtained from [`exit_receiver`].

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use tokio::sync::broadcast;

pub static APPLICATION_EXIT_SENDER: Lazy<broadcast::Sender<()>> = Lazy::new(|| broadcast::channel(2).0);

/// Notify all listening tasks of the termination of the process.
pub fn send_exit() -> Result<()> {
    (APPLICATION_EXIT_SENDER).send(()).context("Failed to send exit lifecycle event")?;
    Ok(())
}

/// A receiver for the exit event. Subscribe before spawning the task that waits on it, so an
/// exit sent in between is not lost.
pub fn exit_receiver() -> broadcast::Receiver<()> {
    APPLICATION_EXIT_SENDER.subscribe()
}

/// Wait for the exit event on a receiver from [`exit_receiver`].
pub async fn recv_exit(receiver: &mut broadcast::Receiver<()>) {
    if let Err(e) = receiver.recv().await {
        log::debug!("Exit event channel: {}", e);
    }
}
