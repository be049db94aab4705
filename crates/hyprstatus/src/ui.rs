//! Everything that changes display state goes through the UI thread.
//!
//! Background sources (the event listener thread, the tray host's runtime, the stdin reader)
//! only hold a [`UiSender`] and post [`UiCommand`]s. The UI loop owns the receiving end and the
//! [`UiThread`] token that display-mutating methods require.

use std::{marker::PhantomData, rc::Rc};

use notifier_host::TrayRegistry;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::actions::UiAction;

/// A part of the bar that can be refreshed on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Workspaces,
    WindowTitle,
    Apps,
    Tray,
}

#[derive(Debug)]
pub enum UiCommand {
    /// Re-read the state behind a section and update it.
    Refresh(Section),
    /// The user clicked something.
    Action(UiAction),
    /// The tray host is running, the UI may now read its registry.
    TrayReady(TrayRegistry),
}

/// Cloneable handle for posting to the UI thread from anywhere.
#[derive(Debug, Clone)]
pub struct UiSender {
    sender: UnboundedSender<UiCommand>,
}

impl UiSender {
    /// Queue a command for the UI thread. Never blocks. Commands posted after the UI loop is
    /// gone are dropped.
    pub fn post(&self, cmd: UiCommand) {
        if let Err(err) = self.sender.send(cmd) {
            log::debug!("UI loop is gone, dropping {:?}", err.0);
        }
    }

    pub fn refresh(&self, section: Section) {
        self.post(UiCommand::Refresh(section));
    }
}

pub fn channel() -> (UiSender, UnboundedReceiver<UiCommand>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (UiSender { sender }, receiver)
}

/// Proof of running on the UI thread. Neither `Send` nor `Sync`, so it can not leave the
/// thread that created it.
#[derive(Debug)]
pub struct UiThread {
    _not_send: PhantomData<Rc<()>>,
}

impl UiThread {
    /// Only the UI loop calls this, once, on the thread it runs on.
    pub(crate) fn claim() -> Self {
        UiThread { _not_send: PhantomData }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_commands_keep_order_per_sender() {
        let (sender, mut receiver) = channel();
        let other = sender.clone();
        std::thread::spawn(move || {
            for section in [Section::Workspaces, Section::Apps, Section::Tray] {
                other.refresh(section);
            }
        })
        .join()
        .unwrap();

        let mut received = Vec::new();
        while let Ok(UiCommand::Refresh(section)) = receiver.try_recv() {
            received.push(section);
        }
        assert_eq!(received, vec![Section::Workspaces, Section::Apps, Section::Tray]);
    }

    #[test]
    fn test_post_after_close_is_dropped() {
        let (sender, receiver) = channel();
        drop(receiver);
        sender.refresh(Section::WindowTitle);
    }
}
