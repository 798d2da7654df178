//! Simple logger. It writes to the console and broadcasts every message to
//! registered listeners, which is how tests and editors observe warnings
//! produced deep inside the physics binding.

use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

/// A message that could be sent by the logger to all listeners.
pub struct LogMessage {
    /// Kind of the message: information, warning or error.
    pub kind: MessageKind,
    /// The source message without logger prefixes.
    pub content: String,
    /// Time point at which the message was recorded. It is relative to the moment when the
    /// logger was initialized.
    pub time: Duration,
}

lazy_static! {
    static ref LOG: Mutex<Log> = Mutex::new(Log {
        verbosity: MessageKind::Information,
        listeners: Default::default(),
        time_origin: Instant::now(),
    });
}

/// A kind of message.
#[derive(Debug, Default, Copy, Clone, PartialOrd, PartialEq, Eq, Ord, Hash)]
#[repr(u32)]
pub enum MessageKind {
    /// Some useful information.
    #[default]
    Information = 0,
    /// A warning.
    Warning = 1,
    /// An error of some kind.
    Error = 2,
}

impl MessageKind {
    fn as_str(self) -> &'static str {
        match self {
            MessageKind::Information => "[INFO]: ",
            MessageKind::Warning => "[WARNING]: ",
            MessageKind::Error => "[ERROR]: ",
        }
    }
}

/// See module docs.
pub struct Log {
    verbosity: MessageKind,
    listeners: Vec<Sender<LogMessage>>,
    time_origin: Instant,
}

impl Log {
    fn write_internal<S>(&mut self, kind: MessageKind, message: S)
    where
        S: AsRef<str>,
    {
        let mut msg = message.as_ref().to_owned();
        if kind as u32 >= self.verbosity as u32 {
            // Notify listeners about the message and remove all disconnected listeners.
            self.listeners.retain(|listener| {
                listener
                    .send(LogMessage {
                        kind,
                        content: msg.clone(),
                        time: Instant::now() - self.time_origin,
                    })
                    .is_ok()
            });

            msg.insert_str(0, kind.as_str());

            let _ = io::stdout().write_all(msg.as_bytes());
        }
    }

    fn writeln_internal<S>(&mut self, kind: MessageKind, message: S)
    where
        S: AsRef<str>,
    {
        let mut msg = message.as_ref().to_owned();
        msg.push('\n');
        self.write_internal(kind, msg)
    }

    /// Writes a string to the console, adds a new line to the end of the message.
    pub fn writeln<S>(kind: MessageKind, msg: S)
    where
        S: AsRef<str>,
    {
        LOG.lock().writeln_internal(kind, msg);
    }

    /// Writes an information message.
    pub fn info<S>(msg: S)
    where
        S: AsRef<str>,
    {
        Self::writeln(MessageKind::Information, msg)
    }

    /// Writes a warning message.
    pub fn warn<S>(msg: S)
    where
        S: AsRef<str>,
    {
        Self::writeln(MessageKind::Warning, msg)
    }

    /// Writes error message.
    pub fn err<S>(msg: S)
    where
        S: AsRef<str>,
    {
        Self::writeln(MessageKind::Error, msg)
    }

    /// Sets verbosity level.
    pub fn set_verbosity(kind: MessageKind) {
        LOG.lock().verbosity = kind;
    }

    /// Adds a listener that will receive a copy of every message passed into the log.
    pub fn add_listener(listener: Sender<LogMessage>) {
        LOG.lock().listeners.push(listener)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::mpsc::channel;

    // The log is a process-wide singleton, so the listener also receives
    // messages from tests running on other threads. Every assertion scans for
    // a marker unique to this test instead of relying on exact queue contents.
    #[test]
    fn test_listener_broadcast_respects_verbosity() {
        let (tx, rx) = channel();
        Log::add_listener(tx);

        Log::info("prewarming contact caches");
        Log::warn("contact cache exceeded soft limit");
        Log::err("contact cache corrupted");

        let mut received: Vec<LogMessage> = rx.try_iter().collect();
        assert!(received
            .iter()
            .any(|m| m.kind == MessageKind::Information
                && m.content.contains("prewarming contact caches")));
        assert!(received
            .iter()
            .any(|m| m.kind == MessageKind::Warning
                && m.content.contains("contact cache exceeded soft limit")));
        assert!(received
            .iter()
            .any(|m| m.kind == MessageKind::Error && m.content.contains("contact cache corrupted")));

        Log::set_verbosity(MessageKind::Warning);
        Log::info("contact cache chatter");
        Log::warn("contact cache pruned");
        Log::set_verbosity(MessageKind::Information);

        received.extend(rx.try_iter());
        assert!(!received
            .iter()
            .any(|m| m.content.contains("contact cache chatter")));
        assert!(received
            .iter()
            .any(|m| m.content.contains("contact cache pruned")));
    }
}
