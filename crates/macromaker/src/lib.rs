//! # macromaker
//!
//! Record keyboard and mouse input as a macro, replay it with the original
//! timing, and drive both from rebindable global shortcuts.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use macromaker::prelude::*;
//! use std::sync::Arc;
//!
//! struct Print;
//! impl OutputDevice for Print {
//!     fn inject(&self, event: &InputEvent) -> Result<()> {
//!         println!("{:?}", event);
//!         Ok(())
//!     }
//! }
//!
//! let (sink, _updates) = ChannelSink::new();
//! let app = MacroMaker::start(&Settings::default(), Arc::new(Print), Arc::new(sink))?;
//!
//! // Feed captured input; Ctrl+Shift+R / S / P record, stop and play.
//! app.bus().dispatch(&RawEvent::key_press(0, KeyCode::CTRL));
//! app.shutdown()?;
//! # Ok::<(), macromaker::Error>(())
//! ```

pub mod app;
pub mod controller;
pub mod settings;

pub use macromaker_core::*;

pub use macromaker_recorder as recorder;
pub use macromaker_recorder::{
    ChannelSink, EventRecorder, Macro, MacroAction, MacroScheduler, MacroSerializer,
    MacroStorage, OutputDevice, PlaybackHandle, PlaybackOptions, PlaybackReport, StatusSink,
    StatusUpdate,
};

pub use app::MacroMaker;
pub use controller::{Command, Controller};
pub use settings::{Paths, Settings, ShortcutEntry};

/// Prelude - import everything you need
pub mod prelude {
    pub use macromaker_core::prelude::*;
    pub use macromaker_recorder::prelude::*;

    pub use crate::app::MacroMaker;
    pub use crate::controller::{Command, Controller};
    pub use crate::settings::{Paths, Settings};
}
