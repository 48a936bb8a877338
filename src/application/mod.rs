//! Application layer - Use cases and port interfaces
//!
//! Contains the hotkey-to-completion pipeline and trait definitions
//! for external system interactions.

pub mod clipboard_txn;
pub mod dispatch;
pub mod event_queue;
pub mod hotkey;
pub mod key_rotator;
pub mod ports;
pub mod signal_bus;
pub mod worker;

// Re-export pipeline components
pub use clipboard_txn::{
    ClipboardLease, ClipboardTransaction, SimulationFlag, TransactionError, TransactionSettings,
};
pub use dispatch::{Completion, DispatchSettings, Dispatcher, Route};
pub use event_queue::{EventQueue, HotkeyEvent, PushOutcome};
pub use hotkey::{HotkeyListener, HotkeyMatcher, HotkeyRegistry, MatchOutcome};
pub use key_rotator::{ApiKeyRotator, KeyStatus, RotationError, RotationPolicy, SelectedKey};
pub use signal_bus::{Signal, SignalBus, SignalReceiver};
pub use worker::{JobControl, QueueWorker};
