//! Global keyboard capture using rdev
//!
//! rdev observes keys system-wide without grabbing them. On macOS the
//! process needs Accessibility permission; on Linux it reads X11 events.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rdev::{listen, Event, EventType, Key};

use crate::application::ports::{HotkeyError, KeyEvent, KeyEventSink, KeyEventSource};
use crate::domain::hotkey::KeyId;

/// How long `start` waits for an immediate listen failure
const STARTUP_WAIT: Duration = Duration::from_millis(200);

type SharedSink = Arc<Mutex<Option<KeyEventSink>>>;

/// rdev-backed key event source
///
/// `rdev::listen` cannot be interrupted, so the listener thread lives for
/// the rest of the process. `stop` detaches the sink and the thread goes
/// quiet until the next `start`.
pub struct RdevKeySource {
    running: Arc<AtomicBool>,
    sink: SharedSink,
    spawned: Mutex<bool>,
}

impl RdevKeySource {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            sink: Arc::new(Mutex::new(None)),
            spawned: Mutex::new(false),
        }
    }

    fn spawn_listener(&self) -> Result<(), HotkeyError> {
        let (err_tx, err_rx) = mpsc::channel::<String>();
        let running = self.running.clone();
        let sink = self.sink.clone();

        std::thread::Builder::new()
            .name("hotprompt-keys".to_string())
            .spawn(move || {
                let callback = move |event: Event| {
                    if !running.load(Ordering::SeqCst) {
                        return;
                    }
                    let Some(key_event) = translate(&event.event_type) else {
                        return;
                    };
                    deliver(&sink, key_event);
                };

                // Blocks until an error occurs or the process exits
                if let Err(e) = listen(callback) {
                    tracing::error!("rdev listen error: {:?}", e);
                    let _ = err_tx.send(format!("{:?}", e));
                }
            })
            .map_err(|e| HotkeyError::Unavailable(e.to_string()))?;

        match err_rx.recv_timeout(STARTUP_WAIT) {
            Ok(message) => Err(HotkeyError::Unavailable(message)),
            Err(_) => Ok(()),
        }
    }
}

impl Default for RdevKeySource {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyEventSource for RdevKeySource {
    fn start(&self, sink: KeyEventSink) -> Result<(), HotkeyError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(HotkeyError::AlreadyRunning);
        }

        *lock(&self.sink) = Some(sink);
        self.running.store(true, Ordering::SeqCst);

        let mut spawned = lock(&self.spawned);
        if !*spawned {
            if let Err(e) = self.spawn_listener() {
                self.running.store(false, Ordering::SeqCst);
                return Err(e);
            }
            *spawned = true;
            tracing::debug!("rdev listener thread started");
        }
        Ok(())
    }

    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        lock(&self.sink).take();
    }
}

/// A panicking sink must not silence the listener for good
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn deliver(sink: &SharedSink, event: KeyEvent) {
    if let Some(deliver) = lock(sink).as_ref() {
        deliver(event);
    }
}

/// Map an rdev event to a key transition we track
fn translate(event: &EventType) -> Option<KeyEvent> {
    match event {
        EventType::KeyPress(key) => map_key(*key).map(KeyEvent::Press),
        EventType::KeyRelease(key) => map_key(*key).map(KeyEvent::Release),
        _ => None,
    }
}

/// Collapse rdev keys into platform-independent identifiers
fn map_key(key: Key) -> Option<KeyId> {
    let id = match key {
        Key::ControlLeft | Key::ControlRight => KeyId::Ctrl,
        Key::Alt | Key::AltGr => KeyId::Alt,
        Key::ShiftLeft | Key::ShiftRight => KeyId::Shift,
        Key::MetaLeft | Key::MetaRight => KeyId::Meta,

        Key::F1 => KeyId::Function(1),
        Key::F2 => KeyId::Function(2),
        Key::F3 => KeyId::Function(3),
        Key::F4 => KeyId::Function(4),
        Key::F5 => KeyId::Function(5),
        Key::F6 => KeyId::Function(6),
        Key::F7 => KeyId::Function(7),
        Key::F8 => KeyId::Function(8),
        Key::F9 => KeyId::Function(9),
        Key::F10 => KeyId::Function(10),
        Key::F11 => KeyId::Function(11),
        Key::F12 => KeyId::Function(12),

        Key::Space => KeyId::Space,
        Key::Tab => KeyId::Tab,
        Key::Return | Key::KpReturn => KeyId::Enter,
        Key::Escape => KeyId::Escape,
        Key::Backspace => KeyId::Backspace,
        Key::Delete => KeyId::Delete,
        Key::Insert => KeyId::Insert,
        Key::Home => KeyId::Home,
        Key::End => KeyId::End,
        Key::PageUp => KeyId::PageUp,
        Key::PageDown => KeyId::PageDown,
        Key::UpArrow => KeyId::Up,
        Key::DownArrow => KeyId::Down,
        Key::LeftArrow => KeyId::Left,
        Key::RightArrow => KeyId::Right,
        Key::PrintScreen => KeyId::PrintScreen,
        Key::Pause => KeyId::Pause,

        Key::Num0 | Key::Kp0 => KeyId::Digit(0),
        Key::Num1 | Key::Kp1 => KeyId::Digit(1),
        Key::Num2 | Key::Kp2 => KeyId::Digit(2),
        Key::Num3 | Key::Kp3 => KeyId::Digit(3),
        Key::Num4 | Key::Kp4 => KeyId::Digit(4),
        Key::Num5 | Key::Kp5 => KeyId::Digit(5),
        Key::Num6 | Key::Kp6 => KeyId::Digit(6),
        Key::Num7 | Key::Kp7 => KeyId::Digit(7),
        Key::Num8 | Key::Kp8 => KeyId::Digit(8),
        Key::Num9 | Key::Kp9 => KeyId::Digit(9),

        Key::KeyA => KeyId::Letter('a'),
        Key::KeyB => KeyId::Letter('b'),
        Key::KeyC => KeyId::Letter('c'),
        Key::KeyD => KeyId::Letter('d'),
        Key::KeyE => KeyId::Letter('e'),
        Key::KeyF => KeyId::Letter('f'),
        Key::KeyG => KeyId::Letter('g'),
        Key::KeyH => KeyId::Letter('h'),
        Key::KeyI => KeyId::Letter('i'),
        Key::KeyJ => KeyId::Letter('j'),
        Key::KeyK => KeyId::Letter('k'),
        Key::KeyL => KeyId::Letter('l'),
        Key::KeyM => KeyId::Letter('m'),
        Key::KeyN => KeyId::Letter('n'),
        Key::KeyO => KeyId::Letter('o'),
        Key::KeyP => KeyId::Letter('p'),
        Key::KeyQ => KeyId::Letter('q'),
        Key::KeyR => KeyId::Letter('r'),
        Key::KeyS => KeyId::Letter('s'),
        Key::KeyT => KeyId::Letter('t'),
        Key::KeyU => KeyId::Letter('u'),
        Key::KeyV => KeyId::Letter('v'),
        Key::KeyW => KeyId::Letter('w'),
        Key::KeyX => KeyId::Letter('x'),
        Key::KeyY => KeyId::Letter('y'),
        Key::KeyZ => KeyId::Letter('z'),

        _ => return None,
    };
    Some(id)
}
