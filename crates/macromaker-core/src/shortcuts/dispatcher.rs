use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::input::{InputEvent, KeyCode, RawEvent};
use crate::shortcuts::ShortcutRegistry;
use crate::source::{EventSource, InputListener, ListenerId};

pub type ShortcutAction = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct KeyState {
    held: HashSet<KeyCode>,
    /// Names that fired and stay latched until one of their keys is released
    latched: HashSet<String>,
}

/// Runs named actions when their bound key combination becomes fully pressed.
///
/// Each press transition fires once. Holding the combination does not refire;
/// releasing any of its keys re-arms it. When several names match the same
/// held keys, the first one in registry order that has an action wins.
pub struct ShortcutDispatcher {
    registry: Arc<RwLock<ShortcutRegistry>>,
    actions: RwLock<HashMap<String, ShortcutAction>>,
    state: Mutex<KeyState>,
    subscription: Mutex<Option<ListenerId>>,
}

impl ShortcutDispatcher {
    pub fn new(registry: Arc<RwLock<ShortcutRegistry>>) -> Self {
        Self {
            registry,
            actions: RwLock::new(HashMap::new()),
            state: Mutex::new(KeyState::default()),
            subscription: Mutex::new(None),
        }
    }

    pub fn add_action<F>(&self, name: impl Into<String>, action: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.actions.write().insert(name.into(), Arc::new(action));
    }

    pub fn remove_action(&self, name: &str) {
        self.actions.write().remove(name);
    }

    pub fn registry(&self) -> &Arc<RwLock<ShortcutRegistry>> {
        &self.registry
    }

    /// Subscribe to `source`. Attaching twice is a no-op.
    pub fn attach(self: &Arc<Self>, source: &dyn EventSource) {
        let mut sub = self.subscription.lock();
        if sub.is_none() {
            *sub = Some(source.subscribe(self.clone()));
        }
    }

    pub fn detach(&self, source: &dyn EventSource) {
        if let Some(id) = self.subscription.lock().take() {
            source.unsubscribe(id);
        }
        let mut state = self.state.lock();
        state.held.clear();
        state.latched.clear();
    }

    pub fn held_keys(&self) -> HashSet<KeyCode> {
        self.state.lock().held.clone()
    }

    fn key_pressed(&self, key: KeyCode) -> Option<(String, ShortcutAction)> {
        let mut state = self.state.lock();
        if !state.held.insert(key) {
            // OS auto-repeat
            return None;
        }

        let registry = self.registry.read();
        let actions = self.actions.read();
        for (name, binding) in registry.iter() {
            if !binding.matches(&state.held) || state.latched.contains(name) {
                continue;
            }
            if let Some(action) = actions.get(name) {
                state.latched.insert(name.to_string());
                return Some((name.to_string(), Arc::clone(action)));
            }
        }
        None
    }

    fn key_released(&self, key: KeyCode) {
        let mut state = self.state.lock();
        state.held.remove(&key);

        let registry = self.registry.read();
        state
            .latched
            .retain(|name| registry.get(name).is_some_and(|b| !b.contains(key)));
    }
}

impl InputListener for ShortcutDispatcher {
    fn on_event(&self, event: &RawEvent) {
        match event.event {
            InputEvent::KeyPress { key } => {
                // Locks are released before the action runs
                if let Some((name, action)) = self.key_pressed(key) {
                    tracing::debug!(%name, "shortcut fired");
                    action();
                }
            }
            InputEvent::KeyRelease { key } => self.key_released(key),
            _ => {}
        }
    }
}
