//! Listener for the Hyprland event socket (`.socket2.sock`).
//!
//! The protocol is plain text: every line has the form `KIND>>DATA`, with no handshake and no
//! acknowledgement. The listener reads the socket on its own thread and invokes the
//! subscribers of each kind right there, so subscribers must not touch UI state directly.

use std::{
    collections::HashMap,
    io::{BufRead, BufReader},
    net::Shutdown,
    os::unix::net::UnixStream,
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::JoinHandle,
};

use crate::{Error, Result, SocketPaths};

pub const SEPARATOR: &str = ">>";

/// Event kinds the status bar reacts to. Hyprland sends many more, which are still
/// delivered to anyone subscribed to them.
pub mod kind {
    pub const WORKSPACE: &str = "workspace";
    pub const WORKSPACE_V2: &str = "workspacev2";
    pub const ACTIVE_WINDOW: &str = "activewindow";
    pub const ACTIVE_WINDOW_V2: &str = "activewindowv2";
    pub const OPEN_WINDOW: &str = "openwindow";
    pub const CLOSE_WINDOW: &str = "closewindow";
    pub const WINDOW_TITLE: &str = "windowtitle";
    pub const WINDOW_TITLE_V2: &str = "windowtitlev2";
    pub const CREATE_WORKSPACE: &str = "createworkspace";
    pub const CREATE_WORKSPACE_V2: &str = "createworkspacev2";
    pub const DESTROY_WORKSPACE: &str = "destroyworkspace";
    pub const DESTROY_WORKSPACE_V2: &str = "destroyworkspacev2";
}

/// A single line received from the event socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: String,
    pub payload: String,
}

impl Event {
    /// Parse one line of the event protocol.
    ///
    /// Only the first separator splits the line, the payload may contain `>>` itself.
    /// Returns `None` for lines without a separator.
    pub fn parse(line: &str) -> Option<Event> {
        let (kind, payload) = line.trim().split_once(SEPARATOR)?;
        Some(Event { kind: kind.to_owned(), payload: payload.to_owned() })
    }

    pub fn typed(&self) -> Option<HyprEvent> {
        HyprEvent::from_event(self)
    }
}

/// Typed view of the events the bar cares about. The `v2` variants are folded into their
/// plain counterparts; the payload is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HyprEvent {
    Workspace(String),
    ActiveWindow(String),
    OpenWindow(String),
    CloseWindow(String),
    WindowTitle(String),
    CreateWorkspace(String),
    DestroyWorkspace(String),
}

impl HyprEvent {
    pub fn from_event(event: &Event) -> Option<HyprEvent> {
        let data = event.payload.clone();
        Some(match event.kind.as_str() {
            kind::WORKSPACE | kind::WORKSPACE_V2 => HyprEvent::Workspace(data),
            kind::ACTIVE_WINDOW | kind::ACTIVE_WINDOW_V2 => HyprEvent::ActiveWindow(data),
            kind::OPEN_WINDOW => HyprEvent::OpenWindow(data),
            kind::CLOSE_WINDOW => HyprEvent::CloseWindow(data),
            kind::WINDOW_TITLE | kind::WINDOW_TITLE_V2 => HyprEvent::WindowTitle(data),
            kind::CREATE_WORKSPACE | kind::CREATE_WORKSPACE_V2 => HyprEvent::CreateWorkspace(data),
            kind::DESTROY_WORKSPACE | kind::DESTROY_WORKSPACE_V2 => HyprEvent::DestroyWorkspace(data),
            _ => return None,
        })
    }
}

pub type Subscriber = Box<dyn Fn(&Event) + Send + 'static>;

/// Subscriber table, keyed by the exact event kind.
#[derive(Default)]
pub struct Subscribers {
    by_kind: HashMap<String, Vec<Subscriber>>,
}

impl Subscribers {
    pub fn on(&mut self, kind: impl Into<String>, subscriber: impl Fn(&Event) + Send + 'static) {
        self.by_kind.entry(kind.into()).or_default().push(Box::new(subscriber));
    }

    /// Invoke every subscriber of the event's kind, in registration order.
    /// Returns how many subscribers were called.
    pub fn dispatch(&self, event: &Event) -> usize {
        match self.by_kind.get(&event.kind) {
            Some(subscribers) => {
                for subscriber in subscribers {
                    subscriber(event);
                }
                subscribers.len()
            }
            None => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.by_kind.is_empty()
    }
}

impl std::fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.by_kind.iter().map(|(kind, subs)| (kind, subs.len()))).finish()
    }
}

#[derive(Debug)]
enum State {
    /// Connected, subscribers can still be added.
    Idle(Subscribers),
    /// The read thread owns the subscribers now.
    Listening(Option<JoinHandle<()>>),
    Stopped,
}

/// Owns one connection to the event socket.
///
/// Lifecycle: [`EventListener::connect`] → [`EventListener::on`]* → [`EventListener::start`] →
/// [`EventListener::stop`]. A listener never reconnects; once the connection drops it stays
/// silent.
#[derive(Debug)]
pub struct EventListener {
    stream: UnixStream,
    state: State,
    running: Arc<AtomicBool>,
}

impl EventListener {
    /// Connect to the event socket of the Hyprland instance we are running under.
    pub fn connect_from_env() -> Result<Self> {
        Self::connect(SocketPaths::from_env()?.event_socket())
    }

    pub fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let stream = UnixStream::connect(path).map_err(|source| Error::Connect { path: path.to_owned(), source })?;
        log::debug!("Connected to Hyprland event socket at {}", path.display());
        Ok(Self::from_stream(stream))
    }

    pub fn from_stream(stream: UnixStream) -> Self {
        Self { stream, state: State::Idle(Subscribers::default()), running: Arc::new(AtomicBool::new(false)) }
    }

    /// Register a subscriber for events of exactly this kind.
    ///
    /// Subscribers run on the listener thread. Registering after [`EventListener::start`] has
    /// no effect.
    pub fn on(&mut self, kind: impl Into<String>, subscriber: impl Fn(&Event) + Send + 'static) {
        match &mut self.state {
            State::Idle(subscribers) => subscribers.on(kind, subscriber),
            State::Listening(_) | State::Stopped => {
                log::warn!("Ignoring subscriber for {:?}: event listener already started", kind.into())
            }
        }
    }

    /// Spawn the read loop. Calling this on a listener that is already listening does nothing.
    pub fn start(&mut self) -> Result<()> {
        let subscribers = match &mut self.state {
            State::Idle(subscribers) => std::mem::take(subscribers),
            State::Listening(_) => return Ok(()),
            State::Stopped => {
                log::warn!("Event listener was stopped and cannot be restarted");
                return Ok(());
            }
        };
        let stream = match self.stream.try_clone() {
            Ok(stream) => stream,
            Err(e) => {
                self.state = State::Idle(subscribers);
                return Err(e.into());
            }
        };

        if subscribers.is_empty() {
            log::debug!("Listening for Hyprland events without subscribers");
        }
        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();
        let handle = std::thread::Builder::new()
            .name("hypr-events".to_string())
            .spawn(move || read_loop(stream, subscribers, running));
        match handle {
            Ok(handle) => {
                self.state = State::Listening(Some(handle));
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                self.state = State::Stopped;
                Err(e.into())
            }
        }
    }

    /// Stop listening and close the connection. Unblocks the read loop if it is waiting for
    /// data. Stopping twice is fine.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        let previous = std::mem::replace(&mut self.state, State::Stopped);
        if matches!(previous, State::Stopped) {
            return;
        }

        if let Err(e) = self.stream.shutdown(Shutdown::Both) {
            log::debug!("Shutting down event socket: {}", e);
        }

        if let State::Listening(Some(handle)) = previous {
            // the read thread can not join itself
            if handle.thread().id() != std::thread::current().id() && handle.join().is_err() {
                log::error!("Hyprland event thread panicked");
            }
        }
        log::debug!("Event listener stopped");
    }

    /// Whether the read loop is still consuming events. Turns false after [`EventListener::stop`]
    /// or once the connection is lost.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for EventListener {
    fn drop(&mut self) {
        self.stop();
    }
}

fn read_loop(stream: UnixStream, subscribers: Subscribers, running: Arc<AtomicBool>) {
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    while running.load(Ordering::SeqCst) {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => {
                if running.swap(false, Ordering::SeqCst) {
                    log::warn!("Hyprland event socket closed, no further events will be received");
                }
                break;
            }
            Ok(_) => {}
            Err(e) => {
                if running.swap(false, Ordering::SeqCst) {
                    log::warn!("Lost connection to Hyprland event socket: {}", e);
                }
                break;
            }
        }

        let line = String::from_utf8_lossy(&buf);
        match Event::parse(&line) {
            Some(event) => {
                let count = subscribers.dispatch(&event);
                log::trace!("{} >> {} ({} subscribers)", event.kind, event.payload, count);
            }
            None => log::trace!("Dropping malformed event line {:?}", line),
        }
    }
}
