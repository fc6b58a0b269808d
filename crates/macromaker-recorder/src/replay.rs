//! Macro playback
//!
//! [`MacroScheduler`] replays a [`Macro`] on one background thread, sleeping
//! the recorded gap before each action. Every sleep can be cut short by
//! [`MacroScheduler::stop`], so a stop request lands between two actions
//! instead of after the next one.
//!
//! Progress and status reports are made directly from the playback thread.
//! Sinks must therefore be `Send + Sync`; use [`ChannelSink`] to hand updates
//! back to a thread of your choosing.

use crate::events::Macro;
use crossbeam_channel::{unbounded, Receiver, Sender};
use macromaker_core::{Error, InputEvent, Result};
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

pub const STATUS_PLAYING: &str = "Playing...";
pub const STATUS_RECORDING: &str = "Recording...";
pub const STATUS_IDLE: &str = "Idling...";

/// Synthesises recorded input. Implemented outside this crate by the OS backend.
pub trait OutputDevice: Send + Sync {
    fn inject(&self, event: &InputEvent) -> Result<()>;
}

/// Fire-and-forget reporting surface (status line, progress bar, message box)
pub trait StatusSink: Send + Sync {
    fn set_status(&self, text: &str);
    fn update_progress(&self, fraction: f64);
    fn show_message(&self, text: &str);
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatusUpdate {
    Status(String),
    Progress(f64),
    Message(String),
}

/// Forwards every report over a channel.
#[derive(Clone)]
pub struct ChannelSink {
    tx: Sender<StatusUpdate>,
}

impl ChannelSink {
    pub fn new() -> (Self, Receiver<StatusUpdate>) {
        let (tx, rx) = unbounded();
        (Self { tx }, rx)
    }
}

impl StatusSink for ChannelSink {
    fn set_status(&self, text: &str) {
        let _ = self.tx.send(StatusUpdate::Status(text.to_string()));
    }

    fn update_progress(&self, fraction: f64) {
        let _ = self.tx.send(StatusUpdate::Progress(fraction));
    }

    fn show_message(&self, text: &str) {
        let _ = self.tx.send(StatusUpdate::Message(text.to_string()));
    }
}

/// One-shot cancellation signal with an interruptible wait.
#[derive(Default)]
pub struct CancelToken {
    cancelled: AtomicBool,
    lock: Mutex<()>,
    cvar: Condvar,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        // Taking the lock orders this notify after any waiter's flag check
        let _guard = self.lock.lock();
        self.cvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Sleep for `delay` unless cancelled. Returns true if cancelled.
    pub fn wait(&self, delay: Duration) -> bool {
        if self.is_cancelled() {
            return true;
        }
        if delay.is_zero() {
            return false;
        }

        let mut guard = self.lock.lock();
        // Past the end of the clock: only a cancel ends the wait
        let Some(deadline) = Instant::now().checked_add(delay) else {
            while !self.is_cancelled() {
                self.cvar.wait(&mut guard);
            }
            return true;
        };
        while !self.is_cancelled() {
            if self.cvar.wait_until(&mut guard, deadline).timed_out() {
                return self.is_cancelled();
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackOptions {
    /// Number of times to play the macro, at least 1
    pub repeats: u32,
    /// Delay divisor, 1.0 = real time
    pub speed: f64,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            repeats: 1,
            speed: 1.0,
        }
    }
}

impl PlaybackOptions {
    pub fn repeats(repeats: u32) -> Self {
        Self {
            repeats,
            ..Default::default()
        }
    }

    pub fn speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.repeats == 0 {
            return Err(Error::invalid_state("repeat count must be at least 1"));
        }
        if !self.speed.is_finite() || self.speed <= 0.0 {
            return Err(Error::invalid_state(format!(
                "playback speed must be positive, got {}",
                self.speed
            )));
        }
        Ok(())
    }

    /// Saturates at `Duration::MAX` for very slow speeds.
    fn scale(&self, delay_ms: u64) -> Duration {
        if self.speed == 1.0 {
            Duration::from_millis(delay_ms)
        } else {
            Duration::try_from_secs_f64(delay_ms as f64 / 1000.0 / self.speed)
                .unwrap_or(Duration::MAX)
        }
    }
}

/// Result of one pass over a macro
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub injected: usize,
    pub cancelled: bool,
}

/// Summary of a whole playback run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackReport {
    /// Repetitions that ran to the end
    pub repetitions: u32,
    pub injected: usize,
    pub cancelled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running { repeats_remaining: u32 },
    Cancelling,
}

/// Play `macro_` once, reporting progress after every injected action.
///
/// Progress is `timestamp / duration`, or 1.0 for a zero-length macro. An
/// empty macro returns immediately without reporting anything.
pub fn run_macro_with_progress(
    macro_: &Macro,
    options: &PlaybackOptions,
    output: &dyn OutputDevice,
    sink: &dyn StatusSink,
    cancel: &CancelToken,
) -> Result<RunStats> {
    let mut stats = RunStats::default();
    let duration = macro_.duration_ms();
    let mut elapsed = 0u64;

    for action in macro_.actions() {
        let delay = action.t.saturating_sub(elapsed);
        if cancel.wait(options.scale(delay)) {
            stats.cancelled = true;
            return Ok(stats);
        }

        output.inject(&action.event).map_err(|e| match e {
            Error::PlaybackInjectionFailed(_) => e,
            other => Error::injection_failed(other.to_string()),
        })?;
        stats.injected += 1;

        elapsed = action.t;
        let progress = if duration == 0 {
            1.0
        } else {
            elapsed as f64 / duration as f64
        };
        sink.update_progress(progress);
    }

    Ok(stats)
}

struct Inner {
    state: SchedulerState,
    cancel: Option<Arc<CancelToken>>,
}

impl Inner {
    /// Running -> Cancelling. With `token`, only if that token's run is the
    /// active one.
    fn request_stop(&mut self, token: Option<&Arc<CancelToken>>) -> bool {
        if let Some(token) = token {
            if !self.cancel.as_ref().is_some_and(|c| Arc::ptr_eq(c, token)) {
                return false;
            }
        }
        let state = self.state;
        match state {
            SchedulerState::Idle => false,
            SchedulerState::Cancelling => true,
            SchedulerState::Running { .. } => {
                self.state = SchedulerState::Cancelling;
                if let Some(cancel) = &self.cancel {
                    cancel.cancel();
                }
                tracing::info!("playback stop requested");
                true
            }
        }
    }
}

/// Plays one macro at a time on a dedicated thread.
pub struct MacroScheduler {
    output: Arc<dyn OutputDevice>,
    sink: Arc<dyn StatusSink>,
    inner: Arc<Mutex<Inner>>,
}

impl MacroScheduler {
    pub fn new(output: Arc<dyn OutputDevice>, sink: Arc<dyn StatusSink>) -> Self {
        Self {
            output,
            sink,
            inner: Arc::new(Mutex::new(Inner {
                state: SchedulerState::Idle,
                cancel: None,
            })),
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.inner.lock().state
    }

    pub fn is_running(&self) -> bool {
        self.state() != SchedulerState::Idle
    }

    /// Start playback. Fails without spawning anything when there is no
    /// macro, the options are invalid, or a run is already active.
    pub fn play(
        &self,
        macro_: Option<Arc<Macro>>,
        options: PlaybackOptions,
    ) -> Result<PlaybackHandle> {
        let macro_ = macro_.ok_or_else(|| Error::invalid_state("no macro recorded"))?;
        options.validate()?;

        let cancel = Arc::new(CancelToken::new());
        {
            let mut inner = self.inner.lock();
            if inner.state != SchedulerState::Idle {
                return Err(Error::invalid_state("playback already running"));
            }
            inner.state = SchedulerState::Running {
                repeats_remaining: options.repeats,
            };
            inner.cancel = Some(cancel.clone());
        }

        tracing::info!(
            actions = macro_.len(),
            duration_ms = macro_.duration_ms(),
            repeats = options.repeats,
            speed = options.speed,
            "playback started"
        );
        self.sink.set_status(STATUS_PLAYING);

        let worker = Worker {
            macro_,
            options,
            output: self.output.clone(),
            sink: self.sink.clone(),
            inner: self.inner.clone(),
            cancel: cancel.clone(),
        };
        let spawned = thread::Builder::new()
            .name("macro-playback".to_string())
            .spawn(move || worker.run());

        match spawned {
            Ok(thread) => Ok(PlaybackHandle {
                thread: Some(thread),
                inner: self.inner.clone(),
                cancel,
            }),
            Err(e) => {
                let mut inner = self.inner.lock();
                inner.state = SchedulerState::Idle;
                inner.cancel = None;
                drop(inner);
                self.sink.set_status(STATUS_IDLE);
                Err(e.into())
            }
        }
    }

    /// Ask the active run to stop. Returns false if nothing is playing.
    pub fn stop(&self) -> bool {
        self.inner.lock().request_stop(None)
    }
}

/// Puts the scheduler back to idle when the worker exits, unwinding included.
struct IdleOnExit {
    inner: Arc<Mutex<Inner>>,
    sink: Arc<dyn StatusSink>,
}

impl Drop for IdleOnExit {
    fn drop(&mut self) {
        if thread::panicking() {
            tracing::error!("playback thread panicked");
            self.sink.show_message("Playback failed: playback thread panicked");
        }
        {
            let mut inner = self.inner.lock();
            inner.state = SchedulerState::Idle;
            inner.cancel = None;
        }
        self.sink.set_status(STATUS_IDLE);
    }
}

struct Worker {
    macro_: Arc<Macro>,
    options: PlaybackOptions,
    output: Arc<dyn OutputDevice>,
    sink: Arc<dyn StatusSink>,
    inner: Arc<Mutex<Inner>>,
    cancel: Arc<CancelToken>,
}

impl Worker {
    fn run(self) -> Result<PlaybackReport> {
        let _idle = IdleOnExit {
            inner: self.inner.clone(),
            sink: self.sink.clone(),
        };

        let mut report = PlaybackReport::default();
        let result = self.repeat(&mut report);
        report.cancelled |= self.cancel.is_cancelled();

        match &result {
            Ok(()) => tracing::info!(
                repetitions = report.repetitions,
                injected = report.injected,
                cancelled = report.cancelled,
                "playback finished"
            ),
            Err(e) => {
                tracing::warn!(error = %e, injected = report.injected, "playback aborted");
                self.sink.show_message(&format!("Playback failed: {}", e));
            }
        }

        result.map(|()| report)
    }

    fn repeat(&self, report: &mut PlaybackReport) -> Result<()> {
        for done in 0..self.options.repeats {
            {
                let mut inner = self.inner.lock();
                if !matches!(inner.state, SchedulerState::Running { .. }) {
                    break;
                }
                inner.state = SchedulerState::Running {
                    repeats_remaining: self.options.repeats - done,
                };
            }

            let stats = run_macro_with_progress(
                &self.macro_,
                &self.options,
                self.output.as_ref(),
                self.sink.as_ref(),
                &self.cancel,
            )?;
            report.injected += stats.injected;
            if stats.cancelled {
                break;
            }
            report.repetitions += 1;
        }
        Ok(())
    }
}

/// Handle to a running playback. Dropping it detaches the thread.
pub struct PlaybackHandle {
    thread: Option<thread::JoinHandle<Result<PlaybackReport>>>,
    inner: Arc<Mutex<Inner>>,
    cancel: Arc<CancelToken>,
}

impl PlaybackHandle {
    /// Same as [`MacroScheduler::stop`], but only while this run is active.
    pub fn cancel(&self) -> bool {
        self.inner.lock().request_stop(Some(&self.cancel))
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    pub fn join(mut self) -> Result<PlaybackReport> {
        let thread = self
            .thread
            .take()
            .ok_or_else(|| Error::invalid_state("playback already joined"))?;
        thread
            .join()
            .map_err(|_| Error::invalid_state("playback thread panicked"))?
    }
}
