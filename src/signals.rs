use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM, SIGUSR1, SIGUSR2};
use signal_hook::iterator::{Handle, Signals};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use tracing::{debug, info};

use crate::error::{KioskError, KioskResult};

/// Operator requests delivered as process signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// SIGTERM / SIGINT
    Terminate,
    /// SIGHUP: rescan image and music sources now.
    Rescan,
    /// SIGUSR1
    TogglePause,
    /// SIGUSR2: stop the music if it plays, start it otherwise.
    ToggleMusic,
}

const HANDLED: [i32; 5] = [SIGTERM, SIGINT, SIGHUP, SIGUSR1, SIGUSR2];

pub fn classify(signal: i32) -> Option<Control> {
    match signal {
        SIGTERM | SIGINT => Some(Control::Terminate),
        SIGHUP => Some(Control::Rescan),
        SIGUSR1 => Some(Control::TogglePause),
        SIGUSR2 => Some(Control::ToggleMusic),
        _ => None,
    }
}

/// Listens for signals on a helper thread and queues them for the frame loop.
pub struct ControlSignals {
    events: Receiver<Control>,
    handle: Handle,
    thread: Option<JoinHandle<()>>,
}

impl ControlSignals {
    pub fn install() -> KioskResult<Self> {
        let mut signals =
            Signals::new(HANDLED).map_err(|e| KioskError::config(format!("failed to install signal handlers: {e}")))?;
        let handle = signals.handle();
        let (tx, events) = mpsc::channel();

        let thread = thread::Builder::new()
            .name("signals".to_string())
            .spawn(move || forward(&mut signals, &tx))
            .map_err(|e| KioskError::config(format!("failed to start signal thread: {e}")))?;

        Ok(Self {
            events,
            handle,
            thread: Some(thread),
        })
    }

    /// Everything received since the last call, oldest first.
    pub fn drain(&self) -> Vec<Control> {
        self.events.try_iter().collect()
    }
}

fn forward(signals: &mut Signals, tx: &Sender<Control>) {
    for signal in signals.forever() {
        let Some(control) = classify(signal) else {
            continue;
        };
        info!("Received signal {} ({:?})", signal, control);
        if tx.send(control).is_err() {
            break;
        }
    }
    debug!("Signal thread finished");
}

impl Drop for ControlSignals {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
