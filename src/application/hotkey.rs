//! Hotkey registry, held-key matching and the listener lifecycle

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::{debug, info};

use crate::domain::hotkey::{HotkeyBinding, KeyCombination, KeyId};

use super::clipboard_txn::SimulationFlag;
use super::event_queue::{EventQueue, HotkeyEvent, PushOutcome};
use super::ports::{HotkeyError, KeyEvent, KeyEventSource};
use super::worker::JobControl;

/// Process-scoped table of bindings.
///
/// The registry is the single writer; readers take `Arc` snapshots.
#[derive(Debug, Default)]
pub struct HotkeyRegistry {
    bindings: RwLock<Arc<Vec<HotkeyBinding>>>,
}

impl HotkeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn init(&self, bindings: Vec<HotkeyBinding>) {
        self.update_bindings(bindings);
    }

    pub fn update_bindings(&self, bindings: Vec<HotkeyBinding>) {
        let mut slot = self.bindings.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Arc::new(bindings);
    }

    pub fn teardown(&self) {
        self.update_bindings(Vec::new());
    }

    pub fn snapshot(&self) -> Arc<Vec<HotkeyBinding>> {
        Arc::clone(&self.bindings.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Binding whose combination equals the held set; the last registered
    /// one wins when several collide
    pub fn find(&self, held: &BTreeSet<KeyId>) -> Option<HotkeyBinding> {
        self.snapshot()
            .iter()
            .rev()
            .find(|binding| binding.combination.matches(held))
            .cloned()
    }
}

/// What a key event led to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    None,
    /// Press ignored while a copy/paste simulation was running
    Suppressed,
    Queued(PushOutcome),
    CancelRequested,
}

/// Tracks held keys and turns completed combinations into queued events.
///
/// Called from the key source thread; never blocks.
pub struct HotkeyMatcher {
    registry: Arc<HotkeyRegistry>,
    queue: Arc<EventQueue>,
    simulation: SimulationFlag,
    cancel_combination: Option<KeyCombination>,
    control: Arc<JobControl>,
    held: Mutex<BTreeSet<KeyId>>,
}

impl HotkeyMatcher {
    pub fn new(
        registry: Arc<HotkeyRegistry>,
        queue: Arc<EventQueue>,
        simulation: SimulationFlag,
        control: Arc<JobControl>,
    ) -> Self {
        Self {
            registry,
            queue,
            simulation,
            cancel_combination: None,
            control,
            held: Mutex::new(BTreeSet::new()),
        }
    }

    pub fn with_cancel_combination(mut self, combination: Option<KeyCombination>) -> Self {
        self.cancel_combination = combination;
        self
    }

    pub fn handle(&self, event: KeyEvent) -> MatchOutcome {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);

        let key = match event {
            KeyEvent::Release(key) => {
                held.remove(&key);
                return MatchOutcome::None;
            }
            KeyEvent::Press(key) => key,
        };

        // Releases are still tracked above so physical keys let go during a
        // simulation do not stay stuck in the held set.
        if self.simulation.is_active() {
            return MatchOutcome::Suppressed;
        }

        // Auto-repeat of a key already down never fires
        if !held.insert(key) {
            return MatchOutcome::None;
        }

        if let Some(cancel) = &self.cancel_combination {
            if cancel.matches(&held) {
                let cancelled = self.control.cancel_current();
                debug!(cancelled, "cancel combination pressed");
                return MatchOutcome::CancelRequested;
            }
        }

        match self.registry.find(&held) {
            Some(binding) => {
                debug!(hotkey = %binding.combination, "hotkey matched");
                MatchOutcome::Queued(self.queue.push(HotkeyEvent::new(binding)))
            }
            None => MatchOutcome::None,
        }
    }

    /// Forget all held keys
    pub fn reset(&self) {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Global hotkey listener over a platform key source
pub struct HotkeyListener {
    source: Box<dyn KeyEventSource>,
    matcher: Arc<HotkeyMatcher>,
    registry: Arc<HotkeyRegistry>,
}

impl HotkeyListener {
    pub fn new(source: Box<dyn KeyEventSource>, matcher: Arc<HotkeyMatcher>) -> Self {
        let registry = Arc::clone(&matcher.registry);
        Self {
            source,
            matcher,
            registry,
        }
    }

    pub fn start(&self, bindings: Vec<HotkeyBinding>) -> Result<(), HotkeyError> {
        let count = bindings.len();
        self.registry.init(bindings);
        self.matcher.reset();

        let matcher = Arc::clone(&self.matcher);
        self.source.start(Box::new(move |event| {
            matcher.handle(event);
        }))?;
        info!(bindings = count, "hotkey listener started");
        Ok(())
    }

    pub fn update_bindings(&self, bindings: Vec<HotkeyBinding>) {
        self.registry.update_bindings(bindings);
    }

    pub fn stop(&self) {
        self.source.stop();
        self.registry.teardown();
        self.matcher.reset();
        info!("hotkey listener stopped");
    }
}
