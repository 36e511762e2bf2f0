use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, trace, warn};

use crate::error::{KioskError, KioskResult};
use crate::playback::protocol::Status;

/// What the reader thread reports to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Status(Status),
    /// The decoder's stdout ended; its exit status is next.
    StreamClosed,
}

/// Background thread consuming one decoder's status stream. It only emits
/// events; every decision is taken by the controller.
pub struct StatusReader {
    handle: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
    done: Receiver<()>,
}

impl StatusReader {
    pub fn spawn(stdout: Box<dyn BufRead + Send>, events: Sender<Event>) -> KioskResult<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let (done_tx, done) = mpsc::channel();

        let thread_stop = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("decoder-status".to_string())
            .spawn(move || {
                read_status_lines(stdout, &events, &thread_stop);
                let _ = events.send(Event::StreamClosed);
                let _ = done_tx.send(());
            })
            .map_err(|e| KioskError::decoder(format!("failed to start status reader: {e}")))?;

        Ok(Self {
            handle: Some(handle),
            stop,
            done,
        })
    }

    /// Tells the thread to stop and waits at most `timeout` for it. A thread
    /// stuck in a read is left detached. Returns true if it was joined.
    pub fn stop_and_join(&mut self, timeout: Duration) -> bool {
        self.stop.store(true, Ordering::SeqCst);
        let Some(handle) = self.handle.take() else {
            return true;
        };
        match self.done.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if handle.join().is_err() {
                    warn!("Decoder status reader panicked");
                }
                true
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!("Decoder status reader did not stop within {:?}", timeout);
                false
            }
        }
    }
}

fn read_status_lines(mut stdout: Box<dyn BufRead + Send>, events: &Sender<Event>, stop: &AtomicBool) {
    let mut line = String::new();
    while !stop.load(Ordering::SeqCst) {
        line.clear();
        match stdout.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                let line = line.trim_end();
                trace!("decoder: {}", line);
                if events.send(Event::Status(Status::parse(line))).is_err() {
                    // Controller moved on to another decoder
                    break;
                }
            }
            Err(e) => {
                debug!("Decoder status stream failed: {}", e);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn forwards_lines_then_reports_close() {
        let (tx, rx) = mpsc::channel();
        let stdout = Box::new(Cursor::new(b"@R MPG123\n@I ID3:x\n@P 0\n".to_vec()));
        let mut reader = StatusReader::spawn(stdout, tx).expect("thread starts");

        let mut events = Vec::new();
        while events.last() != Some(&Event::StreamClosed) {
            events.push(rx.recv_timeout(Duration::from_secs(2)).expect("event arrives"));
        }
        assert!(reader.stop_and_join(Duration::from_secs(2)));

        assert_eq!(
            events,
            vec![
                Event::Status(Status::Ready),
                Event::Status(Status::Loaded),
                Event::Status(Status::Stopped),
                Event::StreamClosed,
            ]
        );
    }

    #[test]
    fn stop_before_start_reads_nothing() {
        let (tx, rx) = mpsc::channel();
        let stop = AtomicBool::new(true);
        let stdout: Box<dyn BufRead + Send> = Box::new(Cursor::new(b"@R MPG123\n".to_vec()));
        read_status_lines(stdout, &tx, &stop);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn join_is_bounded_when_the_stream_stays_open() {
        struct Blocking(mpsc::Receiver<()>);
        impl std::io::Read for Blocking {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                let _ = self.0.recv();
                Ok(0)
            }
        }

        let (hold_tx, hold_rx) = mpsc::channel::<()>();
        let (tx, _rx) = mpsc::channel();
        let stdout = Box::new(std::io::BufReader::new(Blocking(hold_rx)));
        let mut reader = StatusReader::spawn(stdout, tx).expect("thread starts");

        let started = std::time::Instant::now();
        assert!(!reader.stop_and_join(Duration::from_millis(100)));
        assert!(started.elapsed() < Duration::from_secs(1));
        drop(hold_tx);
    }
}
