//! Signal handling for the daemon.
//!
//! OS signals, the configuration watcher and tests all feed one channel. The
//! daemon blocks on that channel between decisions, so any message wakes it
//! immediately.
//!
//! - SIGINT, SIGTERM, SIGHUP: [`SignalMessage::Shutdown`]
//! - SIGUSR1: [`SignalMessage::Wake`], re-evaluate now

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM, SIGUSR1},
    iterator::Signals,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

/// Messages delivered to the daemon loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalMessage {
    /// Stop the daemon.
    Shutdown,
    /// Re-evaluate the theme immediately.
    Wake,
    /// The configuration file was rewritten.
    ConfigChanged,
}

/// Channel and shutdown flag shared between the signal thread and the daemon.
pub struct SignalState {
    /// Cleared once a shutdown signal arrived.
    pub running: Arc<AtomicBool>,
    pub signal_receiver: Receiver<SignalMessage>,
    /// Extra senders for the configuration watcher and tests.
    pub signal_sender: Sender<SignalMessage>,
}

impl SignalState {
    /// A channel with no OS handlers attached.
    pub fn new() -> Self {
        let (signal_sender, signal_receiver) = mpsc::channel();
        Self {
            running: Arc::new(AtomicBool::new(true)),
            signal_receiver,
            signal_sender,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Sender that wakes the daemon; used by the configuration watcher.
    pub fn sender(&self) -> Sender<SignalMessage> {
        self.signal_sender.clone()
    }
}

impl Default for SignalState {
    fn default() -> Self {
        Self::new()
    }
}

fn message_for(signal: i32) -> Option<SignalMessage> {
    match signal {
        SIGINT | SIGTERM | SIGHUP => Some(SignalMessage::Shutdown),
        SIGUSR1 => Some(SignalMessage::Wake),
        _ => None,
    }
}

/// Register OS signal handlers and return the daemon's channel.
///
/// A background thread translates signals into [`SignalMessage`]s until the
/// receiving end is dropped.
pub fn setup_signal_handler(debug_enabled: bool) -> Result<SignalState> {
    let state = SignalState::new();
    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP, SIGUSR1])
        .context("failed to register signal handlers")?;

    let running = Arc::clone(&state.running);
    let sender = state.sender();

    thread::spawn(move || {
        for signal in signals.forever() {
            let Some(message) = message_for(signal) else {
                continue;
            };

            match message {
                SignalMessage::Shutdown => {
                    log_pipe!();
                    log_info!("Received shutdown signal");
                    running.store(false, Ordering::SeqCst);
                }
                SignalMessage::Wake => {
                    if debug_enabled {
                        log_debug!("Received wake-up signal");
                    }
                }
                SignalMessage::ConfigChanged => {}
            }

            if sender.send(message).is_err() || message == SignalMessage::Shutdown {
                break;
            }
        }
    });

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_mapping() {
        assert_eq!(message_for(SIGTERM), Some(SignalMessage::Shutdown));
        assert_eq!(message_for(SIGINT), Some(SignalMessage::Shutdown));
        assert_eq!(message_for(SIGHUP), Some(SignalMessage::Shutdown));
        assert_eq!(message_for(SIGUSR1), Some(SignalMessage::Wake));
        assert_eq!(message_for(0), None);
    }

    #[test]
    fn test_new_state_is_running_and_connected() {
        let state = SignalState::new();
        assert!(state.is_running());
        state.sender().send(SignalMessage::Wake).unwrap();
        assert_eq!(state.signal_receiver.try_recv(), Ok(SignalMessage::Wake));
    }
}
