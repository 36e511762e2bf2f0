use std::collections::VecDeque;
use std::io::Write;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

use crate::config::MusicConfig;
use crate::error::{KioskError, KioskResult};
use crate::playback::process::{DecoderChild, Exit, ProcessHost};
use crate::playback::protocol::{Command, Status};
use crate::playback::reader::{Event, StatusReader};
use crate::playlist::Playlist;

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// One decoder lifetime: its pipes, the reader thread and the event queue.
struct Decoder {
    stdin: Box<dyn Write + Send>,
    child: Box<dyn DecoderChild>,
    events: Receiver<Event>,
    reader: StatusReader,
    stream_closed: bool,
}

/// Keeps background music going through an external decoder process.
///
/// All commands are written from the caller's thread. The reader thread only
/// queues events, which are handled by [`PlaybackController::poll`] (or while
/// waiting for the decoder handshake).
pub struct PlaybackController<H: ProcessHost> {
    config: MusicConfig,
    host: H,
    playlist: Playlist,
    decoder: Option<Decoder>,
    pending: VecDeque<Event>,

    ready: bool,
    playing: bool,
    manual_stop: bool,
    failures: u32,
    // A track was playing when the decoder died
    resume: bool,

    respawn_at: Option<Instant>,
    suspended: bool,
    refreshed: bool,
    rescan_requested: bool,
    closed: bool,
}

impl<H: ProcessHost> PlaybackController<H> {
    pub fn new(config: MusicConfig, host: H) -> Self {
        Self {
            config,
            host,
            playlist: Playlist::default(),
            decoder: None,
            pending: VecDeque::new(),
            ready: false,
            playing: false,
            manual_stop: false,
            failures: 0,
            resume: false,
            respawn_at: None,
            suspended: false,
            refreshed: false,
            rescan_requested: false,
            closed: false,
        }
    }

    /// Replaces the playlist. Never starts playback by itself.
    pub fn load_playlist(&mut self, paths: Vec<PathBuf>) {
        self.playlist.replace_keep_index(paths);
        debug!("Music playlist has {} tracks", self.playlist.len());
        if self.suspended {
            self.refreshed = true;
        }
    }

    /// Starts the next track. Ignored while a track is playing.
    pub fn play_next(&mut self) {
        if self.closed || self.playing {
            trace!("play_next ignored, a track is already playing");
            return;
        }
        if self.suspended || self.respawn_at.is_some() {
            debug!("play_next deferred, decoder is restarting");
            return;
        }
        if self.playlist.advance().is_none() {
            debug!("Music playlist is empty");
            return;
        }
        self.play_current();
    }

    /// Stops playback without advancing to the next track.
    pub fn stop(&mut self) {
        self.resume = false;
        if self.decoder.is_none() {
            debug!("STOP ignored, no decoder running");
            return;
        }
        if self.playing {
            self.manual_stop = true;
        }
        if let Err(e) = self.send(Command::Stop) {
            warn!("Dropped STOP: {}", e);
        }
    }

    /// Pause state lives in the decoder; nothing is tracked here.
    pub fn toggle_pause(&mut self) {
        if self.decoder.is_none() {
            debug!("PAUSE ignored, no decoder running");
            return;
        }
        if let Err(e) = self.send(Command::Pause) {
            warn!("Dropped PAUSE: {}", e);
        }
    }

    /// Asks the decoder to quit and stops the reader, waiting a bounded time
    /// for both. Safe to call more than once.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.playing = false;

        let Some(mut decoder) = self.decoder.take() else {
            return;
        };

        if let Err(e) = write_command(&mut decoder.stdin, &Command::Quit) {
            debug!("QUIT not delivered: {}", e);
        }

        let deadline = Instant::now() + self.config.close_wait();
        decoder.reader.stop_and_join(self.config.close_wait());

        loop {
            match decoder.child.poll_exit() {
                Ok(Some(exit)) => {
                    info!("Decoder shut down ({})", exit);
                    return;
                }
                Ok(None) if Instant::now() < deadline => thread::sleep(EXIT_POLL_INTERVAL),
                Ok(None) => break,
                Err(e) => {
                    warn!("Could not query decoder status: {}", e);
                    break;
                }
            }
        }

        warn!("Decoder ignored QUIT, terminating it");
        if let Err(e) = decoder.child.terminate() {
            warn!("Failed to terminate decoder: {}", e);
        }
    }

    /// Handles queued decoder events and runs crash supervision. Never blocks
    /// longer than one handshake wait.
    pub fn poll(&mut self, now: Instant) {
        if self.closed {
            return;
        }

        if let Some(decoder) = self.decoder.as_ref() {
            loop {
                match decoder.events.try_recv() {
                    Ok(event) => self.pending.push_back(event),
                    Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
                }
            }
        }
        while let Some(event) = self.pending.pop_front() {
            self.handle_event(event);
        }

        self.check_exit(now);

        if self.suspended && self.refreshed {
            info!("Music source rescanned, resuming playback");
            self.suspended = false;
            self.refreshed = false;
            self.respawn_at = Some(now);
        }

        if let Some(at) = self.respawn_at {
            if now >= at {
                self.respawn(now);
            }
        }
    }

    /// True once after the crash threshold was hit.
    pub fn take_rescan_request(&mut self) -> bool {
        std::mem::take(&mut self.rescan_requested)
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    fn play_current(&mut self) {
        let Some(path) = self.playlist.current().map(PathBuf::from) else {
            return;
        };
        match self.send(Command::Load(path.clone())) {
            Ok(()) => {
                info!("Playing {}", path.display());
                self.playing = true;
                self.manual_stop = false;
            }
            Err(e) => warn!("Dropped LOAD {}: {}", path.display(), e),
        }
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Status(Status::Ready) => {
                debug!("Decoder ready");
                self.ready = true;
            }
            Event::Status(Status::Loaded) => {
                self.failures = 0;
            }
            Event::Status(Status::Stopped) => {
                if !self.playing {
                    return;
                }
                self.playing = false;
                if self.manual_stop {
                    self.manual_stop = false;
                    info!("Music stopped");
                } else {
                    self.play_next();
                }
            }
            Event::Status(Status::PlayState(code)) => trace!("Decoder play state {}", code),
            Event::Status(Status::Error(message)) => warn!("Decoder reported: {}", message),
            Event::Status(Status::Other(_)) => {}
            Event::StreamClosed => {
                if let Some(decoder) = self.decoder.as_mut() {
                    decoder.stream_closed = true;
                }
            }
        }
    }

    fn check_exit(&mut self, now: Instant) {
        let exit = match self.decoder.as_mut() {
            Some(decoder) if decoder.stream_closed => match decoder.child.poll_exit() {
                Ok(Some(exit)) => exit,
                Ok(None) => return,
                Err(e) => {
                    warn!("Could not query decoder status: {}", e);
                    Exit::Code(-1)
                }
            },
            _ => return,
        };

        if let Some(mut decoder) = self.decoder.take() {
            decoder.reader.stop_and_join(self.config.close_wait());
        }
        self.pending.clear();
        self.resume = self.playing;
        self.ready = false;
        self.playing = false;
        self.manual_stop = false;

        if exit.is_clean() {
            info!("Decoder exited ({})", exit);
            return;
        }
        self.record_crash(now, &format!("decoder crashed ({exit})"));
    }

    fn record_crash(&mut self, now: Instant, reason: &str) {
        self.failures += 1;
        warn!("{}, failure {}/{}", reason, self.failures, self.config.crash_threshold);

        if self.failures >= self.config.crash_threshold {
            warn!("Decoder keeps failing, waiting for a music rescan before retrying");
            self.failures = 0;
            self.suspended = true;
            self.refreshed = false;
            self.rescan_requested = true;
            self.respawn_at = None;
        } else {
            self.respawn_at = Some(now + self.config.cooldown());
        }
    }

    /// Brings the decoder back and picks up the same track if one was
    /// playing.
    fn respawn(&mut self, now: Instant) {
        self.respawn_at = None;
        if let Err(e) = self.spawn() {
            self.record_crash(now, &e.to_string());
            return;
        }
        if !std::mem::take(&mut self.resume) {
            debug!("Decoder back, music stays stopped");
            return;
        }
        if self.playlist.current().is_some() {
            self.play_current();
        } else {
            self.play_next();
        }
    }

    fn spawn(&mut self) -> KioskResult<()> {
        let pipes = self.host.spawn()?;
        let (tx, events) = mpsc::channel();
        let reader = StatusReader::spawn(pipes.stdout, tx)?;
        self.decoder = Some(Decoder {
            stdin: pipes.stdin,
            child: pipes.child,
            events,
            reader,
            stream_closed: false,
        });
        self.ready = false;
        info!("Decoder started");
        Ok(())
    }

    fn send(&mut self, command: Command) -> KioskResult<()> {
        if self.closed {
            return Err(KioskError::protocol("controller is closed"));
        }
        if self.decoder.is_none() {
            if self.suspended || self.respawn_at.is_some() {
                return Err(KioskError::decoder("decoder is restarting"));
            }
            self.spawn()?;
        }
        self.wait_ready()?;

        let decoder = self
            .decoder
            .as_mut()
            .ok_or_else(|| KioskError::decoder("decoder went away"))?;
        trace!("-> {}", command);
        write_command(&mut decoder.stdin, &command)
            .map_err(|e| KioskError::decoder(format!("failed to write {command}: {e}")))
    }

    /// Waits up to the ready timeout for the handshake, queueing any other
    /// event for the next poll.
    fn wait_ready(&mut self) -> KioskResult<()> {
        if self.ready {
            return Ok(());
        }
        let Some(decoder) = self.decoder.as_ref() else {
            return Err(KioskError::decoder("no decoder running"));
        };

        let deadline = Instant::now() + self.config.ready_wait();
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match decoder.events.recv_timeout(remaining) {
                Ok(Event::Status(Status::Ready)) => {
                    debug!("Decoder ready");
                    self.ready = true;
                    return Ok(());
                }
                Ok(event) => self.pending.push_back(event),
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(KioskError::decoder("decoder status stream ended"));
                }
            }
        }
        Err(KioskError::protocol(format!(
            "decoder not ready after {:?}",
            self.config.ready_wait()
        )))
    }
}

impl<H: ProcessHost> Drop for PlaybackController<H> {
    fn drop(&mut self) {
        self.close();
    }
}

fn write_command(stdin: &mut Box<dyn Write + Send>, command: &Command) -> std::io::Result<()> {
    stdin.write_all(command.to_line().as_bytes())?;
    stdin.flush()
}
