use std::io;
use std::sync::atomic::{AtomicU8, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError, bounded};

use super::double_buffer::DoubleBuffer;
use super::sequencer::Sequencer;
use super::{PlaybackEvent, PlaybackState};
use crate::error::PlaybackError;
use crate::media::types::{Frame, FrameInfo, PlayDirection};

/// Called on the playback thread after each frame reaches the front buffer.
/// It must not step the driver, since manual steps wait on the playback thread.
pub type FrameCallback = Arc<dyn Fn(&FrameInfo) + Send + Sync>;

/// Shortest wait between frames (one GIF delay unit).
const MIN_FRAME_WAIT: Duration = Duration::from_millis(10);
/// Longest wait between frames, whatever the speed modifier.
const MAX_FRAME_WAIT: Duration = Duration::from_secs(3600);
/// Speed modifier change per `faster`/`slower` call.
const SPEED_STEP: f32 = 0.15;
const COMMAND_CAPACITY: usize = 64;
const EVENT_CAPACITY: usize = 256;

enum Command {
    /// Re-check the shared state.
    Wake,
    /// Show a manually stepped frame out of cadence.
    Present(Frame, Option<usize>),
    /// Cut the current frame delay short.
    SkipDelay,
    Shutdown,
}

struct Shared {
    state: AtomicU8,
    /// f32 bits of the delay multiplier.
    speed: AtomicU32,
    events: Sender<PlaybackEvent>,
}

impl Shared {
    fn state(&self) -> PlaybackState {
        PlaybackState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn swap_state(&self, state: PlaybackState) -> PlaybackState {
        PlaybackState::from_u8(self.state.swap(state as u8, Ordering::AcqRel))
    }

    fn transition(&self, from: PlaybackState, to: PlaybackState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn speed(&self) -> f32 {
        f32::from_bits(self.speed.load(Ordering::Relaxed))
    }

    fn emit(&self, event: PlaybackEvent) {
        // Drop if the consumer is behind
        let _ = self.events.try_send(event);
    }
}

/// Runs a [`Sequencer`] on a background thread, presenting each frame
/// through a [`DoubleBuffer`] at the frame's delay scaled by a speed modifier.
///
/// All methods are callable from any thread. Manual stepping happens on the
/// caller's thread under the sequencer lock; the resulting frame is then
/// handed to the playback thread, which stays the only buffer writer.
pub struct PlaybackDriver {
    shared: Arc<Shared>,
    sequencer: Arc<Mutex<Sequencer>>,
    buffer: Arc<DoubleBuffer>,
    commands: Sender<Command>,
    events: Receiver<PlaybackEvent>,
    thread: Option<JoinHandle<()>>,
}

impl PlaybackDriver {
    /// Start the playback thread in the `Stopped` state.
    pub fn spawn(sequencer: Sequencer, callback: Option<FrameCallback>) -> io::Result<Self> {
        let buffer = Arc::new(DoubleBuffer::new(sequencer.width(), sequencer.height()));
        let sequencer = Arc::new(Mutex::new(sequencer));
        let (command_tx, command_rx) = bounded(COMMAND_CAPACITY);
        let (event_tx, event_rx) = bounded(EVENT_CAPACITY);
        let shared = Arc::new(Shared {
            state: AtomicU8::new(PlaybackState::Stopped as u8),
            speed: AtomicU32::new(1.0f32.to_bits()),
            events: event_tx,
        });

        let mut worker = Worker {
            shared: Arc::clone(&shared),
            sequencer: Arc::clone(&sequencer),
            buffer: Arc::clone(&buffer),
            commands: command_rx,
            callback,
            loops_seen: 0,
        };
        let panic_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("flipbook-playback".into())
            .spawn(move || {
                if let Err(e) =
                    std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| worker.run()))
                {
                    let msg = if let Some(s) = e.downcast_ref::<&str>() {
                        s.to_string()
                    } else if let Some(s) = e.downcast_ref::<String>() {
                        s.clone()
                    } else {
                        "unknown panic".into()
                    };
                    log::error!("Playback thread panicked: {msg}");
                    panic_shared.swap_state(PlaybackState::Finished);
                    panic_shared.emit(PlaybackEvent::Finished);
                }
            })?;

        let (w, h) = buffer.dimensions();
        log::info!("Playback driver ready ({w}x{h})");

        Ok(Self {
            shared,
            sequencer,
            buffer,
            commands: command_tx,
            events: event_rx,
            thread: Some(handle),
        })
    }

    pub fn state(&self) -> PlaybackState {
        self.shared.state()
    }

    /// Start or resume the frame cadence. Restarts from the beginning after `Finished`.
    pub fn play(&self) {
        let previous = self.shared.swap_state(PlaybackState::Running);
        if previous == PlaybackState::Running {
            return;
        }
        if previous == PlaybackState::Finished {
            self.lock().reset();
        }
        log::info!("Playback started");
        self.shared.emit(PlaybackEvent::Started);
        self.send(Command::Wake);
    }

    /// Suspend before the next step. No-op unless running.
    pub fn pause(&self) {
        if self.shared.transition(PlaybackState::Running, PlaybackState::Paused) {
            log::info!("Playback paused");
            self.shared.emit(PlaybackEvent::Paused);
            self.send(Command::Wake);
        }
    }

    pub fn toggle_play_pause(&self) {
        match self.state() {
            PlaybackState::Running => self.pause(),
            _ => self.play(),
        }
    }

    /// End the cadence and rewind to the first frame.
    pub fn stop(&self) {
        let previous = self.shared.swap_state(PlaybackState::Stopped);
        // State is set first, so the playback thread cannot step after this reset
        self.lock().reset();
        if previous != PlaybackState::Stopped {
            log::info!("Playback stopped");
            self.shared.emit(PlaybackEvent::Stopped);
        }
        self.send(Command::Wake);
    }

    /// Show the next frame now. Returns false if no frame could be produced.
    pub fn step_forward(&self) -> bool {
        let mut sequencer = self.lock();
        let stepped = sequencer.step();
        self.present_after(sequencer);
        stepped
    }

    /// Show the previous frame (against the current direction) now.
    pub fn step_backward(&self) -> bool {
        let mut sequencer = self.lock();
        let stepped = sequencer.step_back();
        self.present_after(sequencer);
        stepped
    }

    /// Show a random frame now and continue from it.
    pub fn random_jump(&self) -> Result<usize, PlaybackError> {
        let mut sequencer = self.lock();
        let index = sequencer.random_step()?;
        if !sequencer.step() {
            return Err(PlaybackError::Unsupported("no frame at the jump target"));
        }
        self.present_after(sequencer);
        Ok(index)
    }

    /// Show frame `index` now and continue from it.
    pub fn jump_to(&self, index: usize) -> Result<(), PlaybackError> {
        let mut sequencer = self.lock();
        sequencer.jump_to(index)?;
        if !sequencer.step() {
            return Err(PlaybackError::Unsupported("no frame at the jump target"));
        }
        self.present_after(sequencer);
        Ok(())
    }

    pub fn speed(&self) -> f32 {
        self.shared.speed()
    }

    /// Set the delay multiplier: 1.0 is native speed, 0.0 is as fast as possible.
    /// Negative or non-finite values are ignored.
    pub fn set_speed(&self, speed: f32) {
        if !speed.is_finite() || speed < 0.0 {
            log::warn!("Ignoring invalid playback speed {speed}");
            return;
        }
        self.shared.speed.store(speed.to_bits(), Ordering::Relaxed);
        log::debug!("Playback speed modifier {speed:.2}");
    }

    /// Shorten delays by one step and skip the current wait.
    pub fn faster(&self) {
        self.set_speed((self.speed() - SPEED_STEP).max(0.0));
        self.skip_delay();
    }

    /// Lengthen delays by one step.
    pub fn slower(&self) {
        self.set_speed(self.speed() + SPEED_STEP);
    }

    pub fn skip_delay(&self) {
        self.send(Command::SkipDelay);
    }

    pub fn direction(&self) -> PlayDirection {
        self.lock().direction()
    }

    pub fn set_direction(&self, direction: PlayDirection) {
        self.lock().set_direction(direction);
    }

    pub fn is_ping_pong(&self) -> bool {
        self.lock().is_ping_pong()
    }

    pub fn set_ping_pong(&self, ping_pong: bool) {
        self.lock().set_ping_pong(ping_pong);
    }

    /// Info for the sequencer's current frame.
    pub fn current_info(&self) -> Option<FrameInfo> {
        let sequencer = self.lock();
        sequencer
            .current_frame()
            .map(|f| f.info(sequencer.known_num_frames()))
    }

    /// Run `f` with the sequencer locked.
    pub fn with_sequencer<R>(&self, f: impl FnOnce(&mut Sequencer) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn buffer(&self) -> Arc<DoubleBuffer> {
        Arc::clone(&self.buffer)
    }

    /// Event stream. Every clone competes for the same events.
    pub fn events(&self) -> Receiver<PlaybackEvent> {
        self.events.clone()
    }

    /// Replace the animation. The buffer is resized to the new dimensions
    /// and playback is left stopped unless `autoplay` is set.
    pub fn load(&self, sequencer: Sequencer, autoplay: bool) {
        let previous = self.shared.swap_state(PlaybackState::Stopped);
        let (w, h) = (sequencer.width(), sequencer.height());
        *self.lock() = sequencer;
        self.buffer.resize(w, h);
        log::info!("Loaded new animation ({w}x{h})");
        if previous != PlaybackState::Stopped {
            self.shared.emit(PlaybackEvent::Stopped);
        }
        self.send(Command::Wake);
        if autoplay {
            self.play();
        }
    }

    /// Stop the playback thread and join it.
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.thread.take() {
            let _ = self.commands.send(Command::Shutdown);
            let _ = handle.join();
            log::debug!("Playback thread joined");
        }
    }

    fn lock(&self) -> MutexGuard<'_, Sequencer> {
        lock_sequencer(&self.sequencer)
    }

    /// Hand the sequencer's current frame to the playback thread, releasing the lock first.
    fn present_after(&self, sequencer: MutexGuard<'_, Sequencer>) {
        let current = sequencer
            .current_frame()
            .cloned()
            .map(|f| (f, sequencer.known_num_frames()));
        drop(sequencer);
        let Some((frame, num_frames)) = current else {
            return;
        };
        // Blocks while the queue is full so the front buffer never misses a step
        if self
            .commands
            .send(Command::Present(frame, num_frames))
            .is_err()
        {
            log::warn!("Playback thread is not running");
        }
    }

    fn send(&self, command: Command) {
        match self.commands.try_send(command) {
            Ok(()) => {}
            // A full queue already guarantees a wake-up
            Err(TrySendError::Full(_)) => log::debug!("Playback command queue full"),
            Err(TrySendError::Disconnected(_)) => log::warn!("Playback thread is not running"),
        }
    }
}

impl Drop for PlaybackDriver {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn lock_sequencer(sequencer: &Mutex<Sequencer>) -> MutexGuard<'_, Sequencer> {
    sequencer.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Frame delay scaled by the speed modifier, floored at one delay unit.
fn scaled_delay(delay_ms: u32, speed: f32) -> Duration {
    let secs = f64::from(delay_ms) * f64::from(speed) / 1000.0;
    Duration::try_from_secs_f64(secs)
        .unwrap_or(MAX_FRAME_WAIT)
        .clamp(MIN_FRAME_WAIT, MAX_FRAME_WAIT)
}

/// State owned by the playback thread.
struct Worker {
    shared: Arc<Shared>,
    sequencer: Arc<Mutex<Sequencer>>,
    buffer: Arc<DoubleBuffer>,
    commands: Receiver<Command>,
    callback: Option<FrameCallback>,
    loops_seen: u64,
}

impl Worker {
    fn run(&mut self) {
        loop {
            if self.shared.state() == PlaybackState::Running {
                if let Some(delay) = self.advance() {
                    if !self.wait(delay) {
                        break;
                    }
                }
            } else {
                match self.commands.recv() {
                    Ok(command) => {
                        if !self.handle(command) {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        }
        log::debug!("Playback thread exiting");
    }

    /// Step and present one frame. Returns the delay before the next step,
    /// or `None` when playback should not continue.
    fn advance(&mut self) -> Option<Duration> {
        let stepped = {
            let mut sequencer = lock_sequencer(&self.sequencer);
            // Re-checked under the lock so a concurrent stop's reset is not undone
            if self.shared.state() != PlaybackState::Running {
                return None;
            }
            if sequencer.step() {
                sequencer
                    .current_frame()
                    .cloned()
                    .map(|f| (f, sequencer.known_num_frames(), sequencer.loop_count()))
            } else {
                None
            }
        };

        let Some((frame, num_frames, loops)) = stepped else {
            if self
                .shared
                .transition(PlaybackState::Running, PlaybackState::Finished)
            {
                log::info!("Playback finished: no frame to show");
                self.shared.emit(PlaybackEvent::Finished);
            }
            return None;
        };

        if loops > self.loops_seen {
            self.shared.emit(PlaybackEvent::Repeating);
        }
        self.loops_seen = loops;

        self.present(&frame, num_frames);
        Some(scaled_delay(frame.delay_ms, self.shared.speed()))
    }

    /// Wait up to `delay`, serving commands. Returns false on shutdown.
    fn wait(&mut self, delay: Duration) -> bool {
        let deadline = Instant::now() + delay;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return true;
            }
            match self.commands.recv_timeout(remaining) {
                Ok(Command::SkipDelay) | Err(RecvTimeoutError::Timeout) => return true,
                Ok(command) => {
                    if !self.handle(command) {
                        return false;
                    }
                    if self.shared.state() != PlaybackState::Running {
                        return true;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => return false,
            }
        }
    }

    fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Wake | Command::SkipDelay => {}
            Command::Present(frame, num_frames) => self.present(&frame, num_frames),
            Command::Shutdown => return false,
        }
        true
    }

    fn present(&self, frame: &Frame, num_frames: Option<usize>) {
        self.buffer.back_buffer().copy_from(&frame.composed);
        self.buffer.swap_images();

        let info = frame.info(num_frames);
        if let Some(callback) = &self.callback {
            callback(&info);
        }
        self.shared.emit(PlaybackEvent::Frame(info));
    }
}
