//! Clipboard snapshot/capture/apply with recursion guarding

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::job::{CapturedInput, ClipboardContent, ImageEncodeError, JobError};

use super::ports::{Chord, Clipboard, ClipboardError, Keystroke, KeystrokeError};

/// Clipboard transaction errors
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("Clipboard stayed empty after {attempts} copy attempts")]
    EmptyCapture { attempts: u32 },

    #[error(transparent)]
    Clipboard(#[from] ClipboardError),

    #[error(transparent)]
    Keystroke(#[from] KeystrokeError),

    #[error(transparent)]
    Image(#[from] ImageEncodeError),

    #[error("Capture cancelled")]
    Cancelled,
}

impl From<TransactionError> for JobError {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::EmptyCapture { attempts } => JobError::EmptyCapture { attempts },
            TransactionError::Cancelled => JobError::Cancelled,
            other => JobError::Clipboard(other.to_string()),
        }
    }
}

/// Timing for copy/paste simulation
#[derive(Debug, Clone)]
pub struct TransactionSettings {
    pub capture_attempts: u32,
    pub capture_backoff: Duration,
    pub settle_delay: Duration,
}

impl Default for TransactionSettings {
    fn default() -> Self {
        Self {
            capture_attempts: 3,
            capture_backoff: Duration::from_millis(100),
            settle_delay: Duration::from_millis(100),
        }
    }
}

/// Read-only view of the "simulation in progress" flag.
///
/// The hotkey listener ignores key presses while it is set.
#[derive(Debug, Clone, Default)]
pub struct SimulationFlag(Arc<AtomicBool>);

impl SimulationFlag {
    #[cfg(test)]
    pub(crate) fn from_shared(flag: Arc<AtomicBool>) -> Self {
        Self(flag)
    }

    pub fn is_active(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Holds the flag for the duration of one simulated shortcut
struct SimulationGuard {
    flag: Arc<AtomicBool>,
}

impl SimulationGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self {
            flag: Arc::clone(flag),
        }
    }
}

impl Drop for SimulationGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Pre-capture clipboard snapshot that must be handed back via
/// [`ClipboardTransaction::apply`] or [`ClipboardTransaction::restore`]
#[must_use = "the original clipboard must be restored"]
#[derive(Debug)]
pub struct ClipboardLease {
    snapshot: ClipboardContent,
}

impl ClipboardLease {
    pub fn snapshot(&self) -> &ClipboardContent {
        &self.snapshot
    }
}

/// Clipboard transaction over a clipboard and a keystroke injector
pub struct ClipboardTransaction<C, K>
where
    C: Clipboard,
    K: Keystroke,
{
    clipboard: C,
    keystroke: K,
    simulating: Arc<AtomicBool>,
    settings: TransactionSettings,
}

impl<C, K> ClipboardTransaction<C, K>
where
    C: Clipboard,
    K: Keystroke,
{
    pub fn new(clipboard: C, keystroke: K, settings: TransactionSettings) -> Self {
        Self {
            clipboard,
            keystroke,
            simulating: Arc::new(AtomicBool::new(false)),
            settings,
        }
    }

    /// Flag view for the hotkey listener
    pub fn simulation_flag(&self) -> SimulationFlag {
        SimulationFlag(Arc::clone(&self.simulating))
    }

    /// Pull the user's selection into the clipboard and read it.
    ///
    /// The clipboard is snapshotted and cleared first so a fresh copy can be
    /// told apart from stale content. On any error the snapshot is written
    /// back before returning.
    pub async fn capture(
        &self,
        cancel: &CancellationToken,
    ) -> Result<(CapturedInput, ClipboardLease), TransactionError> {
        let snapshot = self.clipboard.read().await?;
        debug!(snapshot = %snapshot.describe(), "clipboard snapshot taken");
        let lease = ClipboardLease { snapshot };

        match self.copy_selection(cancel).await {
            Ok(input) => Ok((input, lease)),
            Err(e) => {
                if let Err(restore_err) = self.restore(lease).await {
                    warn!(error = %restore_err, "failed to restore clipboard after capture error");
                }
                Err(e)
            }
        }
    }

    async fn copy_selection(
        &self,
        cancel: &CancellationToken,
    ) -> Result<CapturedInput, TransactionError> {
        self.clipboard.write(&ClipboardContent::Empty).await?;

        let attempts = self.settings.capture_attempts.max(1);
        for attempt in 1..=attempts {
            if cancel.is_cancelled() {
                return Err(TransactionError::Cancelled);
            }

            {
                let _guard = SimulationGuard::acquire(&self.simulating);
                self.keystroke.send_chord(Chord::Copy).await?;
                tokio::time::sleep(self.settings.settle_delay).await;
            }

            let content = self.clipboard.read().await?;
            debug!(attempt, content = %content.describe(), "copy attempt");
            if let Some(input) = CapturedInput::from_clipboard(&content)? {
                return Ok(input);
            }

            if attempt < attempts {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(TransactionError::Cancelled),
                    _ = tokio::time::sleep(self.settings.capture_backoff * attempt) => {}
                }
            }
        }

        Err(TransactionError::EmptyCapture { attempts })
    }

    /// Paste `text` over the selection, then put the snapshot back.
    ///
    /// A failed restore is logged and does not fail the apply.
    pub async fn apply(&self, lease: ClipboardLease, text: &str) -> Result<(), TransactionError> {
        let pasted = self.paste(text).await;

        if let Err(e) = self.restore(lease).await {
            warn!(error = %e, "failed to restore clipboard after paste");
        }
        pasted
    }

    async fn paste(&self, text: &str) -> Result<(), TransactionError> {
        self.clipboard
            .write(&ClipboardContent::Text(text.to_string()))
            .await?;

        let _guard = SimulationGuard::acquire(&self.simulating);
        self.keystroke.send_chord(Chord::Paste).await?;
        tokio::time::sleep(self.settings.settle_delay).await;
        Ok(())
    }

    /// Write the snapshot back unchanged
    pub async fn restore(&self, lease: ClipboardLease) -> Result<(), ClipboardError> {
        self.clipboard.write(&lease.snapshot).await?;
        debug!(snapshot = %lease.snapshot.describe(), "clipboard restored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Clipboard whose reads after a copy come from a script
    struct ScriptedClipboard {
        current: Mutex<ClipboardContent>,
        after_copy: Mutex<VecDeque<ClipboardContent>>,
        writes: Mutex<Vec<ClipboardContent>>,
        fail_writes_of_snapshot: bool,
    }

    impl ScriptedClipboard {
        fn new(initial: ClipboardContent, after_copy: Vec<ClipboardContent>) -> Arc<Self> {
            Arc::new(Self {
                current: Mutex::new(initial),
                after_copy: Mutex::new(after_copy.into()),
                writes: Mutex::new(Vec::new()),
                fail_writes_of_snapshot: false,
            })
        }

        fn on_copy(&self) {
            if let Some(next) = self.after_copy.lock().unwrap().pop_front() {
                *self.current.lock().unwrap() = next;
            }
        }

        fn current(&self) -> ClipboardContent {
            self.current.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Clipboard for Arc<ScriptedClipboard> {
        async fn read(&self) -> Result<ClipboardContent, ClipboardError> {
            Ok(self.current())
        }

        async fn write(&self, content: &ClipboardContent) -> Result<(), ClipboardError> {
            if self.fail_writes_of_snapshot && content.is_image() {
                return Err(ClipboardError::WriteFailed("busy".into()));
            }
            self.writes.lock().unwrap().push(content.clone());
            *self.current.lock().unwrap() = content.clone();
            Ok(())
        }
    }

    struct RecordingKeystroke {
        clipboard: Arc<ScriptedClipboard>,
        flag_seen: Mutex<Vec<bool>>,
        flag: Mutex<Option<SimulationFlag>>,
        chords: Mutex<Vec<Chord>>,
    }

    #[async_trait]
    impl Keystroke for Arc<RecordingKeystroke> {
        async fn send_chord(&self, chord: Chord) -> Result<(), KeystrokeError> {
            if let Some(flag) = self.flag.lock().unwrap().as_ref() {
                self.flag_seen.lock().unwrap().push(flag.is_active());
            }
            self.chords.lock().unwrap().push(chord);
            if chord == Chord::Copy {
                self.clipboard.on_copy();
            }
            Ok(())
        }
    }

    fn fast() -> TransactionSettings {
        TransactionSettings {
            capture_attempts: 3,
            capture_backoff: Duration::from_millis(1),
            settle_delay: Duration::from_millis(1),
        }
    }

    fn setup(
        clipboard: Arc<ScriptedClipboard>,
    ) -> (
        ClipboardTransaction<Arc<ScriptedClipboard>, Arc<RecordingKeystroke>>,
        Arc<RecordingKeystroke>,
    ) {
        let keystroke = Arc::new(RecordingKeystroke {
            clipboard: Arc::clone(&clipboard),
            flag_seen: Mutex::new(Vec::new()),
            flag: Mutex::new(None),
            chords: Mutex::new(Vec::new()),
        });
        let txn = ClipboardTransaction::new(clipboard, Arc::clone(&keystroke), fast());
        *keystroke.flag.lock().unwrap() = Some(txn.simulation_flag());
        (txn, keystroke)
    }

    #[tokio::test]
    async fn capture_then_apply_restores_snapshot() {
        let original = ClipboardContent::Text("user clipboard".into());
        let clipboard = ScriptedClipboard::new(
            original.clone(),
            vec![ClipboardContent::Text("selected".into())],
        );
        let (txn, keystroke) = setup(Arc::clone(&clipboard));

        let (input, lease) = txn.capture(&CancellationToken::new()).await.unwrap();
        assert_eq!(input, CapturedInput::Text("selected".into()));
        assert_eq!(lease.snapshot(), &original);

        txn.apply(lease, "fixed").await.unwrap();

        assert_eq!(clipboard.current(), original);
        assert_eq!(*keystroke.chords.lock().unwrap(), vec![Chord::Copy, Chord::Paste]);
        let writes = clipboard.writes.lock().unwrap();
        assert!(writes.contains(&ClipboardContent::Text("fixed".into())));
    }

    #[tokio::test]
    async fn guard_is_set_during_simulation_and_cleared_after() {
        let clipboard = ScriptedClipboard::new(
            ClipboardContent::Empty,
            vec![ClipboardContent::Text("x".into())],
        );
        let (txn, keystroke) = setup(clipboard);
        let flag = txn.simulation_flag();

        let (_, lease) = txn.capture(&CancellationToken::new()).await.unwrap();
        assert!(!flag.is_active());
        txn.apply(lease, "y").await.unwrap();
        assert!(!flag.is_active());
        assert_eq!(*keystroke.flag_seen.lock().unwrap(), vec![true, true]);
    }

    #[tokio::test]
    async fn empty_capture_after_all_attempts() {
        let original = ClipboardContent::Text("keep me".into());
        let clipboard = ScriptedClipboard::new(original.clone(), Vec::new());
        let (txn, keystroke) = setup(Arc::clone(&clipboard));

        let err = txn.capture(&CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, TransactionError::EmptyCapture { attempts: 3 }));
        assert_eq!(keystroke.chords.lock().unwrap().len(), 3);
        assert_eq!(clipboard.current(), original);
    }

    #[tokio::test]
    async fn image_capture_is_png_encoded() {
        let image = crate::domain::job::RgbaImage::new(1, 1, vec![1, 2, 3, 255]);
        let clipboard = ScriptedClipboard::new(
            ClipboardContent::Empty,
            vec![ClipboardContent::Image(image)],
        );
        let (txn, _) = setup(clipboard);

        let (input, lease) = txn.capture(&CancellationToken::new()).await.unwrap();
        assert!(matches!(input, CapturedInput::Image(ref png) if png.mime_type() == "image/png"));
        txn.restore(lease).await.unwrap();
    }

    #[tokio::test]
    async fn cancelled_capture_restores() {
        let original = ClipboardContent::Text("orig".into());
        let clipboard = ScriptedClipboard::new(original.clone(), Vec::new());
        let (txn, _) = setup(Arc::clone(&clipboard));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = txn.capture(&cancel).await.unwrap_err();
        assert!(matches!(err, TransactionError::Cancelled));
        assert_eq!(clipboard.current(), original);
    }

    #[tokio::test]
    async fn restore_failure_does_not_fail_apply() {
        let image = crate::domain::job::RgbaImage::new(1, 1, vec![0, 0, 0, 255]);
        let clipboard = Arc::new(ScriptedClipboard {
            current: Mutex::new(ClipboardContent::Image(image)),
            after_copy: Mutex::new(vec![ClipboardContent::Text("sel".into())].into()),
            writes: Mutex::new(Vec::new()),
            fail_writes_of_snapshot: true,
        });
        let (txn, _) = setup(Arc::clone(&clipboard));

        let (_, lease) = txn.capture(&CancellationToken::new()).await.unwrap();
        assert!(txn.apply(lease, "out").await.is_ok());
    }

    #[test]
    fn transaction_errors_map_to_job_errors() {
        let err: JobError = TransactionError::EmptyCapture { attempts: 3 }.into();
        assert!(matches!(err, JobError::EmptyCapture { attempts: 3 }));
        let err: JobError = TransactionError::Cancelled.into();
        assert!(err.is_cancelled());
        let err: JobError =
            TransactionError::Clipboard(ClipboardError::ReadFailed("x".into())).into();
        assert!(matches!(err, JobError::Clipboard(_)));
    }
}
