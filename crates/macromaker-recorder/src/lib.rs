//! macromaker-recorder - input macro recording and replay
//!
//! Captures timestamped input from an event source into an immutable
//! [`Macro`] and plays it back with the recorded timing.
//!
//! ## Pieces
//!
//! - **events**: [`Macro`] and [`MacroAction`]
//! - **recorder**: [`EventRecorder`], armed between start and stop
//! - **replay**: [`MacroScheduler`], interruptible timed playback with repeats
//! - **storage**: JSON-lines [`MacroSerializer`] and a directory-backed [`MacroStorage`]

pub mod events;
pub mod recorder;
pub mod replay;
pub mod storage;

pub use events::*;
pub use recorder::EventRecorder;
pub use replay::{
    run_macro_with_progress, CancelToken, ChannelSink, MacroScheduler, OutputDevice,
    PlaybackHandle, PlaybackOptions, PlaybackReport, RunStats, SchedulerState, StatusSink,
    StatusUpdate, STATUS_IDLE, STATUS_PLAYING, STATUS_RECORDING,
};
pub use storage::{MacroSerializer, MacroStorage};

pub mod prelude {
    pub use crate::events::*;
    pub use crate::recorder::EventRecorder;
    pub use crate::replay::{
        ChannelSink, MacroScheduler, OutputDevice, PlaybackHandle, PlaybackOptions,
        PlaybackReport, SchedulerState, StatusSink, StatusUpdate,
    };
    pub use crate::storage::{MacroSerializer, MacroStorage};
}
