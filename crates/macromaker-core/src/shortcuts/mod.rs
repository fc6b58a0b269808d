//! Named, rebindable keyboard shortcuts
//!
//! The registry maps action names (such as [`common::PLAY`]) to key
//! combinations. It does not know what the actions do; the dispatcher pairs
//! names with callbacks.

mod binding;
mod dispatcher;
mod registry;

pub use binding::ShortcutBinding;
pub use dispatcher::{ShortcutAction, ShortcutDispatcher};
pub use registry::ShortcutRegistry;

/// Well-known shortcut names and their default bindings.
pub mod common {
    pub const START_RECORDING: &str = "control.startRecording";
    pub const STOP: &str = "control.stop";
    pub const PLAY: &str = "control.play";

    pub const DEFAULTS: &[(&str, &str)] = &[
        (START_RECORDING, "Ctrl+Shift+R"),
        (STOP, "Ctrl+Shift+S"),
        (PLAY, "Ctrl+Shift+P"),
    ];
}

/// Registry holding [`common::DEFAULTS`] in declaration order.
pub fn default_registry() -> ShortcutRegistry {
    let mut registry = ShortcutRegistry::new();
    for (name, spec) in common::DEFAULTS {
        match ShortcutBinding::parse(spec) {
            Ok(binding) => registry.put(*name, binding),
            Err(e) => tracing::warn!(name, error = %e, "skipping default shortcut"),
        }
    }
    registry
}
