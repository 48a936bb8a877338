//! Queue worker: turns hotkey events into jobs, one at a time

use std::sync::{Mutex, PoisonError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::job::{CapturedInput, GenerationRequest, Job, JobError, JobOutcome, JobState};
use crate::domain::provider::ProviderId;

use super::clipboard_txn::ClipboardTransaction;
use super::dispatch::Dispatcher;
use super::event_queue::{EventQueue, HotkeyEvent};
use super::ports::{Clipboard, Keystroke};
use super::signal_bus::SignalBus;

/// Learning-mode request issued once a text job has been pasted
struct Explanation {
    provider: ProviderId,
    request: GenerationRequest,
}

/// Handle to the in-flight job's cancellation token
#[derive(Debug, Default)]
pub struct JobControl {
    current: Mutex<Option<CancellationToken>>,
}

impl JobControl {
    pub fn install(&self, token: CancellationToken) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    pub fn clear(&self) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Cancel the in-flight job, if any. Returns whether one was running.
    pub fn cancel_current(&self) -> bool {
        match self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

/// Single consumer of the event queue.
///
/// Jobs run strictly one after another, so at most one job ever owns the
/// clipboard.
pub struct QueueWorker<C, K>
where
    C: Clipboard,
    K: Keystroke,
{
    transaction: ClipboardTransaction<C, K>,
    dispatcher: Arc<Dispatcher>,
    signals: SignalBus,
    control: Arc<JobControl>,
    next_id: AtomicU64,
}

impl<C, K> QueueWorker<C, K>
where
    C: Clipboard,
    K: Keystroke,
{
    pub fn new(
        transaction: ClipboardTransaction<C, K>,
        dispatcher: Dispatcher,
        signals: SignalBus,
        control: Arc<JobControl>,
    ) -> Self {
        Self {
            transaction,
            dispatcher: Arc::new(dispatcher),
            signals,
            control,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn control(&self) -> Arc<JobControl> {
        Arc::clone(&self.control)
    }

    pub fn transaction(&self) -> &ClipboardTransaction<C, K> {
        &self.transaction
    }

    /// Pop and process events until shutdown or queue close
    pub async fn run(&self, queue: Arc<EventQueue>, shutdown: CancellationToken) {
        info!("queue worker started");
        loop {
            let event = tokio::select! {
                _ = shutdown.cancelled() => break,
                event = queue.pop() => event,
            };
            match event {
                Some(event) => {
                    self.process(event, &shutdown).await;
                    queue.finish();
                }
                None => break,
            }
        }
        queue.close();
        info!("queue worker stopped");
    }

    /// Run one job to a terminal state and emit its notification
    pub async fn process(&self, event: HotkeyEvent, shutdown: &CancellationToken) -> JobOutcome {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let token = shutdown.child_token();
        let mut job = Job::new(id, event.binding, token.clone());
        let label = job.binding().label();

        self.control.install(token);
        info!(job = id, hotkey = %label, queued_ms = event.timestamp.elapsed().as_millis() as u64, "job started");
        self.signals.job_started(&label);
        self.signals
            .log(format!("Processing {}", label), Some(job.binding().log_color.as_str()));

        let result = self.execute(&mut job, shutdown).await;
        self.control.clear();

        match result {
            Ok(text) => {
                self.finish(&mut job, JobState::Completed);
                let elapsed = job.elapsed().as_secs_f64();
                info!(job = id, elapsed_secs = elapsed, chars = text.chars().count(), "job completed");
                self.signals.job_succeeded(&label, elapsed);
                JobOutcome::Completed { text }
            }
            Err(JobError::Cancelled) => {
                self.finish(&mut job, JobState::Cancelled);
                info!(job = id, "job cancelled");
                self.signals.log(format!("{} cancelled", label), None);
                JobOutcome::Cancelled
            }
            Err(err) => {
                self.finish(&mut job, JobState::Failed);
                warn!(job = id, error = %err, "job failed");
                if let Some(kind) = err.kind() {
                    self.signals.job_failed(&label, kind, err.to_string());
                }
                JobOutcome::Failed(err)
            }
        }
    }

    fn finish(&self, job: &mut Job, state: JobState) {
        if let Err(e) = job.advance(state) {
            warn!(job = job.id(), error = %e, "unexpected terminal transition");
        }
    }

    fn advance(job: &mut Job, state: JobState) -> Result<(), JobError> {
        debug!(job = job.id(), from = %job.state(), to = %state, "job transition");
        job.advance(state)
            .map_err(|e| JobError::Internal(e.to_string()))
    }

    async fn execute(&self, job: &mut Job, shutdown: &CancellationToken) -> Result<String, JobError> {
        Self::advance(job, JobState::Capturing)?;
        let (input, lease) = self.transaction.capture(job.cancel_token()).await?;
        job.set_input(input);

        let result = self.complete(job).await;

        // A result that lands after cancellation is discarded
        let result = match result {
            Ok(_) if job.is_cancelled() => Err(JobError::Cancelled),
            other => other,
        };

        match result {
            Ok((text, explanation)) => {
                self.transaction.apply(lease, &text).await?;
                if let Some(explanation) = explanation {
                    self.explain(job, explanation, shutdown.child_token());
                }
                Ok(text)
            }
            Err(e) => {
                if let Err(restore_err) = self.transaction.restore(lease).await {
                    warn!(job = job.id(), error = %restore_err, "failed to restore clipboard");
                }
                Err(e)
            }
        }
    }

    /// Capturing -> Dispatching -> AwaitingCompletion
    async fn complete(&self, job: &mut Job) -> Result<(String, Option<Explanation>), JobError> {
        Self::advance(job, JobState::Dispatching)?;
        let route = self.dispatcher.resolve_route(job.binding())?;
        let input = job
            .take_input()
            .ok_or_else(|| JobError::Internal("job has no captured input".to_string()))?;
        let original = match &input {
            CapturedInput::Text(text) => Some(text.clone()),
            CapturedInput::Image(_) => None,
        };
        let request = GenerationRequest::resolve(&job.binding().prompt, input, route.model);

        Self::advance(job, JobState::AwaitingCompletion)?;
        let completion = self
            .dispatcher
            .dispatch(route.provider, &request, job.cancel_token())
            .await?;
        debug!(
            job = job.id(),
            provider = %completion.provider,
            key = %completion.key_label,
            "completion received"
        );

        let text = completion.text.trim().to_string();
        if text.is_empty() {
            return Err(JobError::Provider("provider returned empty text".to_string()));
        }

        let explanation = match (&job.binding().learning_prompt, original) {
            (Some(template), Some(original)) if original.trim() != text => Some(Explanation {
                provider: route.provider,
                request: GenerationRequest::explanation(template, &original, &text, request.model),
            }),
            _ => None,
        };
        Ok((text, explanation))
    }

    /// Ask for an explanation of the changes on a detached task.
    ///
    /// Runs after the clipboard is released and never delays the next job;
    /// the answer arrives as a log line in the binding's color.
    fn explain(&self, job: &Job, explanation: Explanation, cancel: CancellationToken) {
        let dispatcher = Arc::clone(&self.dispatcher);
        let signals = self.signals.clone();
        let id = job.id();
        let label = job.binding().label();
        let color = job.binding().log_color.clone();

        debug!(job = id, "requesting explanation");
        tokio::spawn(async move {
            match dispatcher
                .dispatch(explanation.provider, &explanation.request, &cancel)
                .await
            {
                Ok(completion) => {
                    let text = completion.text.trim();
                    if !text.is_empty() {
                        let message = format!("Explanation for {}:\n{}", label, text);
                        signals.log(message, Some(color.as_str()));
                    }
                }
                Err(JobError::Cancelled) => debug!(job = id, "explanation cancelled"),
                Err(e) => warn!(job = id, error = %e, "explanation failed"),
            }
        });
    }
}
