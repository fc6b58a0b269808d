//! macromaker-core - input model and rebindable shortcuts
//!
//! Building blocks shared by the recorder and the controller:
//!
//! - **error**: one error taxonomy for every crate
//! - **input**: key codes, mouse buttons, raw input events
//! - **source**: the event-source boundary and an in-process [`EventBus`]
//! - **shortcuts**: bindings, the insertion-ordered registry, the dispatcher

pub mod error;
pub mod input;
pub mod shortcuts;
pub mod source;

pub use error::{Error, ErrorCode, Result};
pub use input::{InputEvent, KeyCode, MouseButton, RawEvent};
pub use shortcuts::{ShortcutBinding, ShortcutDispatcher, ShortcutRegistry};
pub use source::{EventBus, EventSource, InputListener, ListenerId};

pub mod prelude {
    pub use crate::error::{Error, ErrorCode, Result};
    pub use crate::input::{key_codes, InputEvent, KeyCode, MouseButton, RawEvent};
    pub use crate::shortcuts::{
        common, default_registry, ShortcutBinding, ShortcutDispatcher, ShortcutRegistry,
    };
    pub use crate::source::{EventBus, EventSource, InputListener, ListenerId};
}
