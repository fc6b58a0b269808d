//! Command surface tying the recorder, the scheduler, and the serializer together
//!
//! The controller is owned by a single control thread. Other threads (the
//! shortcut dispatcher on the input hook thread, a UI) talk to it by sending
//! [`Command`]s, so macro state is never shared across threads.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crossbeam_channel::Receiver;
use macromaker_core::{Error, EventSource, Result};
use macromaker_recorder::{
    EventRecorder, Macro, MacroScheduler, MacroSerializer, OutputDevice, PlaybackHandle,
    PlaybackOptions, PlaybackReport, StatusSink, STATUS_IDLE, STATUS_RECORDING,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Record,
    Stop,
    /// `None` uses the configured default repeat count
    Play { repeats: Option<u32> },
    NewMacro,
    Open(PathBuf),
    Save(PathBuf),
    Shutdown,
}

pub struct Controller {
    source: Arc<dyn EventSource>,
    sink: Arc<dyn StatusSink>,
    recorder: EventRecorder,
    scheduler: MacroScheduler,
    serializer: MacroSerializer,
    options: PlaybackOptions,
    macro_: Option<Arc<Macro>>,
    playback: Option<PlaybackHandle>,
}

impl Controller {
    pub fn new(
        source: Arc<dyn EventSource>,
        output: Arc<dyn OutputDevice>,
        sink: Arc<dyn StatusSink>,
        options: PlaybackOptions,
    ) -> Self {
        Self {
            scheduler: MacroScheduler::new(output, sink.clone()),
            source,
            sink,
            recorder: EventRecorder::new(),
            serializer: MacroSerializer::new(),
            options,
            macro_: None,
            playback: None,
        }
    }

    pub fn current_macro(&self) -> Option<Arc<Macro>> {
        self.macro_.clone()
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    pub fn is_playing(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn default_repeats(&self) -> u32 {
        self.options.repeats
    }

    pub fn set_default_repeats(&mut self, repeats: u32) -> Result<()> {
        let options = PlaybackOptions {
            repeats,
            ..self.options
        };
        options.validate()?;
        self.options = options;
        Ok(())
    }

    pub fn record(&mut self) -> Result<()> {
        if self.is_playing() {
            return Err(Error::invalid_state("cannot record during playback"));
        }
        if self.is_recording() {
            return Err(Error::invalid_state("already recording"));
        }
        self.recorder.reset()?;
        self.recorder.start_recording(self.source.as_ref())?;
        self.sink.set_status(STATUS_RECORDING);
        Ok(())
    }

    /// Stops playback if one is running, otherwise ends the recording.
    pub fn stop(&mut self) -> Result<()> {
        if self.scheduler.stop() {
            return Ok(());
        }
        if self.recorder.is_recording() {
            let recorded = self.recorder.stop_recording(self.source.as_ref())?;
            self.macro_ = Some(recorded);
            self.sink.set_status(STATUS_IDLE);
        }
        Ok(())
    }

    pub fn play(&mut self, repeats: u32) -> Result<()> {
        if self.recorder.is_recording() {
            return Err(Error::invalid_state("cannot play while recording"));
        }
        let options = PlaybackOptions {
            repeats,
            ..self.options
        };
        let handle = self.scheduler.play(self.macro_.clone(), options)?;
        // The previous run has finished (play would have failed otherwise)
        self.playback = Some(handle);
        Ok(())
    }

    /// Block until the current playback ends. `None` if nothing was started.
    pub fn wait_for_playback(&mut self) -> Option<Result<PlaybackReport>> {
        self.playback.take().map(PlaybackHandle::join)
    }

    pub fn new_macro(&mut self) -> Result<()> {
        self.macro_ = None;
        Ok(())
    }

    /// Replace the current macro with one read from `reader`. On failure the
    /// current macro is kept.
    pub fn open<R: BufRead>(&mut self, reader: R) -> Result<()> {
        match self.serializer.deserialize(reader) {
            Ok(loaded) => {
                tracing::info!(actions = loaded.len(), "macro opened");
                self.macro_ = Some(Arc::new(loaded));
                Ok(())
            }
            Err(e) => {
                self.sink.show_message(&format!("Could not open macro: {}", e));
                Err(e)
            }
        }
    }

    pub fn save<W: Write>(&self, writer: W) -> Result<()> {
        let Some(macro_) = &self.macro_ else {
            return Err(Error::invalid_state("no macro recorded"));
        };
        self.serializer.serialize(macro_, writer).inspect_err(|e| {
            self.sink.show_message(&format!("Could not save macro: {}", e));
        })
    }

    pub fn open_path(&mut self, path: &Path) -> Result<()> {
        let file = File::open(path).map_err(|e| {
            self.sink.show_message(&format!("Could not open file: {}", e));
            Error::from(e)
        })?;
        self.open(BufReader::new(file))
    }

    pub fn save_path(&self, path: &Path) -> Result<()> {
        if self.macro_.is_none() {
            return Err(Error::invalid_state("no macro recorded"));
        }
        let file = File::create(path).map_err(|e| {
            self.sink.show_message(&format!("Could not save to file: {}", e));
            Error::from(e)
        })?;
        self.save(file)
    }

    pub fn handle(&mut self, command: Command) -> Result<()> {
        tracing::debug!(?command, "handling command");
        match command {
            Command::Record => self.record(),
            Command::Stop => self.stop(),
            Command::Play { repeats } => self.play(repeats.unwrap_or(self.options.repeats)),
            Command::NewMacro => self.new_macro(),
            Command::Open(path) => self.open_path(&path),
            Command::Save(path) => self.save_path(&path),
            Command::Shutdown => {
                self.shutdown();
                Ok(())
            }
        }
    }

    /// Process commands until `Shutdown` arrives or every sender is gone.
    ///
    /// Errors never escape: I/O failures were already reported by the
    /// command itself, everything else is reported here.
    pub fn serve(&mut self, commands: Receiver<Command>) {
        for command in commands.iter() {
            if command == Command::Shutdown {
                break;
            }
            if let Err(e) = self.handle(command) {
                tracing::warn!(error = %e, "command failed");
                if !e.is_recoverable() {
                    self.sink.show_message(&e.to_string());
                }
            }
        }
        self.shutdown();
    }

    /// Stop playback and recording, waiting for the playback thread.
    pub fn shutdown(&mut self) {
        self.scheduler.stop();
        if let Some(Err(e)) = self.wait_for_playback() {
            tracing::warn!(error = %e, "playback ended with error");
        }
        if self.recorder.is_recording() {
            if let Err(e) = self.stop() {
                tracing::warn!(error = %e, "could not stop recording");
            }
        }
    }
}
