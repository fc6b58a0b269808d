//! Event recorder
//!
//! Subscribes to an event source while armed and turns every raw event into a
//! [`MacroAction`] stamped relative to the recording start.

use crate::events::{Macro, MacroAction};
use macromaker_core::{Error, EventSource, InputListener, ListenerId, RawEvent, Result};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Default)]
struct Buffer {
    recording: bool,
    start_ms: u64,
    actions: Vec<MacroAction>,
}

/// The listener half, shared with the event source.
#[derive(Default)]
struct Capture {
    buffer: Mutex<Buffer>,
}

impl InputListener for Capture {
    fn on_event(&self, event: &RawEvent) {
        let mut buf = self.buffer.lock();
        if !buf.recording {
            return;
        }
        let last = buf.actions.last().map_or(0, |a| a.t);
        let t = event.time_ms.saturating_sub(buf.start_ms).max(last);
        buf.actions.push(MacroAction::new(t, event.event.clone()));
    }
}

/// Idle -> Recording -> Idle
pub struct EventRecorder {
    capture: Arc<Capture>,
    subscription: Option<ListenerId>,
    recorded: Option<Arc<Macro>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self {
            capture: Arc::new(Capture::default()),
            subscription: None,
            recorded: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.subscription.is_some()
    }

    /// Actions captured so far in the current recording
    pub fn action_count(&self) -> usize {
        self.capture.buffer.lock().actions.len()
    }

    /// Forget the last recorded macro.
    pub fn reset(&mut self) -> Result<()> {
        if self.is_recording() {
            return Err(Error::invalid_state("cannot reset while recording"));
        }
        self.recorded = None;
        Ok(())
    }

    pub fn start_recording(&mut self, source: &dyn EventSource) -> Result<()> {
        let start_ms = source.now_ms();
        self.start_recording_at(source, start_ms)
    }

    /// Start recording with an explicit origin on the source's clock.
    pub fn start_recording_at(&mut self, source: &dyn EventSource, start_ms: u64) -> Result<()> {
        if self.is_recording() {
            return Err(Error::invalid_state("already recording"));
        }

        {
            let mut buf = self.capture.buffer.lock();
            buf.recording = true;
            buf.start_ms = start_ms;
            buf.actions.clear();
        }
        self.subscription = Some(source.subscribe(self.capture.clone()));

        tracing::info!(start_ms, "recording started");
        Ok(())
    }

    pub fn stop_recording(&mut self, source: &dyn EventSource) -> Result<Arc<Macro>> {
        let id = self
            .subscription
            .take()
            .ok_or_else(|| Error::invalid_state("not recording"))?;
        source.unsubscribe(id);

        let actions = {
            let mut buf = self.capture.buffer.lock();
            buf.recording = false;
            std::mem::take(&mut buf.actions)
        };

        let recorded = Arc::new(Macro::from_sorted(actions));
        tracing::info!(
            actions = recorded.len(),
            duration_ms = recorded.duration_ms(),
            "recording stopped"
        );
        self.recorded = Some(recorded.clone());
        Ok(recorded)
    }

    /// The last recorded macro, or an empty one.
    pub fn recorded_macro(&self) -> Arc<Macro> {
        self.recorded
            .clone()
            .unwrap_or_else(|| Arc::new(Macro::empty()))
    }
}

impl Default for EventRecorder {
    fn default() -> Self {
        Self::new()
    }
}
