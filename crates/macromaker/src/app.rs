//! Application wiring
//!
//! ```text
//! OS hook -> EventBus -> ShortcutDispatcher --Command--> control thread (Controller)
//!                     \-> EventRecorder (while recording)
//! ```

use crate::controller::{Command, Controller};
use crate::settings::Settings;
use crossbeam_channel::Sender;
use macromaker_core::shortcuts::common;
use macromaker_core::{Error, EventBus, EventSource, Result, ShortcutDispatcher, ShortcutRegistry};
use macromaker_recorder::{OutputDevice, StatusSink};
use parking_lot::RwLock;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

pub struct MacroMaker {
    bus: Arc<EventBus>,
    dispatcher: Arc<ShortcutDispatcher>,
    commands: Sender<Command>,
    control: Option<JoinHandle<()>>,
}

impl MacroMaker {
    /// Build the pipeline and start the control thread.
    ///
    /// Input enters through [`MacroMaker::bus`]; the common shortcuts drive
    /// recording and playback.
    pub fn start(
        settings: &Settings,
        output: Arc<dyn OutputDevice>,
        sink: Arc<dyn StatusSink>,
    ) -> Result<Self> {
        settings.validate()?;

        let bus = Arc::new(EventBus::new());
        let registry = Arc::new(RwLock::new(settings.registry()));
        let (commands, rx) = crossbeam_channel::unbounded();

        let mut controller = Controller::new(
            bus.clone() as Arc<dyn EventSource>,
            output,
            sink,
            settings.playback_options(),
        );
        let control = thread::Builder::new()
            .name("macromaker-control".into())
            .spawn(move || controller.serve(rx))?;

        let dispatcher = Arc::new(ShortcutDispatcher::new(registry));
        for (name, command) in [
            (common::START_RECORDING, Command::Record),
            (common::STOP, Command::Stop),
            (common::PLAY, Command::Play { repeats: None }),
        ] {
            let tx = commands.clone();
            dispatcher.add_action(name, move || {
                if tx.send(command.clone()).is_err() {
                    tracing::warn!("control thread is gone, dropping shortcut command");
                }
            });
        }
        dispatcher.attach(bus.as_ref());

        tracing::info!("macromaker started");
        Ok(Self {
            bus,
            dispatcher,
            commands,
            control: Some(control),
        })
    }

    /// Where captured input is published.
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn registry(&self) -> &Arc<RwLock<ShortcutRegistry>> {
        self.dispatcher.registry()
    }

    pub fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| Error::invalid_state("control thread has stopped"))
    }

    /// Detach from input, stop any activity and wait for the control thread.
    pub fn shutdown(mut self) -> Result<()> {
        self.stop_control()
    }

    fn stop_control(&mut self) -> Result<()> {
        let Some(control) = self.control.take() else {
            return Ok(());
        };
        self.dispatcher.detach(self.bus.as_ref());
        // Already gone if it panicked
        let _ = self.commands.send(Command::Shutdown);
        control
            .join()
            .map_err(|_| Error::invalid_state("control thread panicked"))?;
        tracing::info!("macromaker stopped");
        Ok(())
    }
}

impl Drop for MacroMaker {
    fn drop(&mut self) {
        if let Err(e) = self.stop_control() {
            tracing::warn!(error = %e, "shutdown failed");
        }
    }
}
