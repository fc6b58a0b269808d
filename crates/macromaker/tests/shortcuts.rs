//! Drives the full pipeline: bus -> dispatcher -> control thread -> recorder/scheduler.

use crossbeam_channel::Receiver;
use macromaker::prelude::*;
use macromaker::recorder::{STATUS_IDLE, STATUS_PLAYING, STATUS_RECORDING};
use parking_lot::Mutex;
use std::io::BufReader;
use std::sync::Arc;
use std::time::Duration;

const R: KeyCode = KeyCode(key_codes::R);
const S: KeyCode = KeyCode(key_codes::S);
const P: KeyCode = KeyCode(key_codes::P);
const F9: KeyCode = KeyCode(key_codes::F9);

#[derive(Default)]
struct Collect(Mutex<Vec<InputEvent>>);

impl OutputDevice for Collect {
    fn inject(&self, event: &InputEvent) -> Result<()> {
        self.0.lock().push(event.clone());
        Ok(())
    }
}

struct Harness {
    app: MacroMaker,
    device: Arc<Collect>,
    updates: Receiver<StatusUpdate>,
}

impl Harness {
    fn start(settings: &Settings) -> Self {
        let device = Arc::new(Collect::default());
        let (sink, updates) = ChannelSink::new();
        let app = MacroMaker::start(settings, device.clone(), Arc::new(sink)).unwrap();
        Self {
            app,
            device,
            updates,
        }
    }

    fn send(&self, event: InputEvent) {
        let bus = self.app.bus();
        bus.dispatch(&RawEvent::new(bus.now_ms(), event));
    }

    fn press(&self, key: KeyCode) {
        self.send(InputEvent::KeyPress { key });
    }

    fn release(&self, key: KeyCode) {
        self.send(InputEvent::KeyRelease { key });
    }

    fn chord(&self, key: KeyCode) {
        self.press(KeyCode::CTRL);
        self.press(KeyCode::SHIFT);
        self.press(key);
        self.release(key);
        self.release(KeyCode::SHIFT);
        self.release(KeyCode::CTRL);
    }

    fn wait_status(&self, expected: &str) {
        loop {
            match self.updates.recv_timeout(Duration::from_secs(5)) {
                Ok(StatusUpdate::Status(s)) if s == expected => return,
                Ok(_) => continue,
                Err(e) => panic!("no '{}' status: {}", expected, e),
            }
        }
    }

    fn wait_message(&self) -> String {
        loop {
            match self.updates.recv_timeout(Duration::from_secs(5)) {
                Ok(StatusUpdate::Message(m)) => return m,
                Ok(_) => continue,
                Err(e) => panic!("no message: {}", e),
            }
        }
    }
}

#[test]
fn record_stop_play_through_shortcuts() {
    let dir = tempfile::tempdir().unwrap();
    let saved = dir.path().join("session.jsonl");
    let h = Harness::start(&Settings::default());

    h.chord(R);
    h.wait_status(STATUS_RECORDING);

    h.send(InputEvent::MouseMove { x: 5, y: 5 });
    h.send(InputEvent::MousePress { button: MouseButton::Left });
    h.send(InputEvent::MouseRelease { button: MouseButton::Left });

    h.chord(S);
    h.wait_status(STATUS_IDLE);

    h.chord(P);
    h.wait_status(STATUS_PLAYING);
    h.wait_status(STATUS_IDLE);

    h.app.send(Command::Save(saved.clone())).unwrap();
    h.app.shutdown().unwrap();

    let file = std::fs::File::open(&saved).unwrap();
    let recorded = MacroSerializer::new()
        .deserialize(BufReader::new(file))
        .unwrap();
    let expected: Vec<InputEvent> = recorded.actions().iter().map(|a| a.event.clone()).collect();

    assert!(expected.contains(&InputEvent::MouseMove { x: 5, y: 5 }));
    assert!(expected.contains(&InputEvent::KeyPress { key: S }));
    assert!(!expected.contains(&InputEvent::KeyPress { key: P }));
    assert_eq!(*h.device.0.lock(), expected);
}

#[test]
fn rebinding_takes_effect_immediately() {
    let h = Harness::start(&Settings::default());

    h.app.registry().write().rebind(common::PLAY, "F9").unwrap();

    // Old chord does nothing, new key reaches the controller
    h.chord(P);
    h.press(F9);
    h.release(F9);

    assert_eq!(h.wait_message(), "invalid state: no macro recorded");
    assert!(h.updates.try_recv().is_err());
    h.app.shutdown().unwrap();
}

#[test]
fn shortcuts_come_from_settings() {
    let mut settings = Settings::default();
    let mut registry = settings.registry();
    registry.rebind(common::START_RECORDING, "F9").unwrap();
    settings.set_registry(&registry);

    let h = Harness::start(&settings);
    h.press(F9);
    h.wait_status(STATUS_RECORDING);
    h.release(F9);

    h.app.send(Command::Stop).unwrap();
    h.wait_status(STATUS_IDLE);
    h.app.shutdown().unwrap();
}

#[test]
fn open_failure_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let h = Harness::start(&Settings::default());

    h.app
        .send(Command::Open(dir.path().join("missing.jsonl")))
        .unwrap();
    assert!(h.wait_message().starts_with("Could not open file"));
    h.app.shutdown().unwrap();
}

#[test]
fn invalid_settings_are_rejected() {
    let settings = Settings {
        default_repeats: 0,
        ..Settings::default()
    };
    let (sink, _updates) = ChannelSink::new();
    let result = MacroMaker::start(&settings, Arc::new(Collect::default()), Arc::new(sink));
    assert!(matches!(result, Err(Error::InvalidState(_))));
}
