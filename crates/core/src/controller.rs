//! Lifecycle of a single analysis request.
//!
//! The controller owns an explicit state container and publishes every change
//! through a `watch` channel; front-ends subscribe instead of keeping their own
//! copies of the selection, result and progress.
//!
//! ```text
//! Idle -> Validating -> InFlight -> Succeeded | Failed
//!            |                          |
//!            +-> (previous phase)       +-> reset() -> Idle
//! ```

use std::sync::{Arc, Mutex};

use rand::Rng;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    config::ProgressConfig,
    error::{ClientError, GENERIC_FAILURE_MESSAGE, NETWORK_ERROR, ValidationError},
    transport::Transport,
    types::{AnalysisRequest, AnalysisResult, SelectedFile},
};

/// Fallback message when the backend flags a failure without saying why.
pub const ANALYSIS_FAILED_MESSAGE: &str = "Analysis failed";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LifecycleState {
    #[default]
    Idle,
    Validating,
    InFlight,
    Succeeded,
    Failed,
}

impl LifecycleState {
    pub fn is_busy(self) -> bool {
        matches!(self, LifecycleState::Validating | LifecycleState::InFlight)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, LifecycleState::Succeeded | LifecycleState::Failed)
    }
}

/// Snapshot published to observers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerState {
    pub phase: LifecycleState,
    pub file: Option<SelectedFile>,
    pub analysis_type: Option<String>,
    pub custom_prompt: String,
    pub result: Option<AnalysisResult>,
    /// User-facing error of the last request.
    pub error: Option<String>,
    pub validation: Option<ValidationError>,
    /// Cosmetic progress, 0..=100.
    pub progress: u8,
    request_seq: u64,
}

impl ControllerState {
    /// Whether the analyze action should be enabled.
    pub fn can_submit(&self) -> bool {
        !self.phase.is_busy() && self.file.is_some() && self.analysis_type.is_some()
    }
}

#[derive(Clone)]
pub struct LifecycleController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    transport: Arc<dyn Transport>,
    state: Arc<watch::Sender<ControllerState>>,
    progress: ProgressConfig,
    ticker: Mutex<Option<(u64, JoinHandle<()>)>>,
}

impl LifecycleController {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_progress(transport, ProgressConfig::default())
    }

    pub fn with_progress(transport: Arc<dyn Transport>, progress: ProgressConfig) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                transport,
                state: Arc::new(watch::Sender::new(ControllerState::default())),
                progress,
                ticker: Mutex::new(None),
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ControllerState> {
        self.inner.state.subscribe()
    }

    pub fn state(&self) -> ControllerState {
        self.inner.state.borrow().clone()
    }

    /// Replace the selected file. Any previous result or error is stale and dropped.
    ///
    /// Refused while a request is in flight; returns whether the selection changed.
    pub fn select_file(&self, file: Option<SelectedFile>) -> bool {
        let changed = self.inner.state.send_if_modified(|s| {
            if s.phase.is_busy() {
                return false;
            }
            s.file = file;
            s.result = None;
            s.error = None;
            s.validation = None;
            if s.phase.is_terminal() {
                s.phase = LifecycleState::Idle;
                s.progress = 0;
            }
            true
        });
        if !changed {
            debug!("selection change refused while a request is in flight");
        }
        changed
    }

    pub fn set_analysis_type(&self, analysis_type: Option<String>) {
        self.inner.state.send_modify(|s| {
            s.analysis_type = analysis_type.filter(|t| !t.trim().is_empty());
            s.validation = None;
        });
    }

    pub fn set_custom_prompt(&self, prompt: impl Into<String>) {
        let prompt = prompt.into();
        self.inner.state.send_modify(|s| {
            s.custom_prompt = prompt;
            s.validation = None;
        });
    }

    /// Submit the controller's current selection.
    pub async fn analyze(&self) -> Result<AnalysisResult, ValidationError> {
        let snapshot = self.state();
        self.submit(
            snapshot.file.as_ref(),
            snapshot.analysis_type.as_deref().unwrap_or_default(),
            Some(&snapshot.custom_prompt),
        )
        .await
    }

    /// Validate, send one request and record its outcome.
    ///
    /// Only validation problems are returned as errors. Remote and transport
    /// failures come back as a failed [`AnalysisResult`] and leave the
    /// controller in [`LifecycleState::Failed`].
    pub async fn submit(
        &self,
        file: Option<&SelectedFile>,
        analysis_type: &str,
        custom_prompt: Option<&str>,
    ) -> Result<AnalysisResult, ValidationError> {
        let mut previous = LifecycleState::Idle;
        let started = self.inner.state.send_if_modified(|s| {
            if s.phase.is_busy() {
                return false;
            }
            previous = s.phase;
            s.phase = LifecycleState::Validating;
            s.validation = None;
            true
        });
        if !started {
            warn!("analysis requested while another one is in flight");
            return Err(ValidationError::RequestInFlight);
        }

        let request = match AnalysisRequest::build(file, analysis_type, custom_prompt) {
            Ok(request) => request,
            Err(err) => {
                debug!(error = %err, "analysis request rejected");
                self.inner.state.send_modify(|s| {
                    s.phase = previous;
                    s.validation = Some(err.clone());
                });
                return Err(err);
            }
        };

        let mut seq = 0;
        self.inner.state.send_modify(|s| {
            s.request_seq += 1;
            seq = s.request_seq;
            s.phase = LifecycleState::InFlight;
            s.progress = 0;
            s.result = None;
            s.error = None;
        });
        self.start_ticker(seq);

        info!(
            file = request.file.name(),
            size = request.file.size(),
            analysis_type = %request.analysis_type,
            "submitting video for analysis"
        );
        let outcome = self.inner.transport.analyze(&request).await;
        self.stop_ticker(Some(seq));

        let (result, error) = interpret(outcome, &request.analysis_type);

        let applied = self.inner.state.send_if_modified(|s| {
            if s.request_seq != seq {
                return false;
            }
            s.phase = if result.success {
                LifecycleState::Succeeded
            } else {
                LifecycleState::Failed
            };
            s.progress = 100;
            s.result = Some(result.clone());
            s.error = error.clone();
            true
        });

        if applied {
            info!(success = result.success, "analysis finished");
            self.schedule_progress_reset(seq);
        } else {
            debug!("controller was reset while in flight; dropping result");
        }

        Ok(result)
    }

    /// Back to Idle with nothing selected. Safe to call at any time.
    pub fn reset(&self) {
        self.stop_ticker(None);
        self.inner.state.send_modify(|s| {
            // Bumping the sequence makes an in-flight request drop its result.
            let request_seq = if s.phase.is_busy() {
                s.request_seq + 1
            } else {
                s.request_seq
            };
            *s = ControllerState {
                request_seq,
                ..ControllerState::default()
            };
        });
    }

    fn start_ticker(&self, seq: u64) {
        let state = Arc::clone(&self.inner.state);
        let config = self.inner.progress.clone();
        let max_step = config.max_step.max(1);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(config.interval);
            // First tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                let step = rand::rng().random_range(1..=max_step);
                state.send_if_modified(|s| {
                    if s.phase != LifecycleState::InFlight
                        || s.request_seq != seq
                        || s.progress >= config.ceiling
                    {
                        return false;
                    }
                    s.progress = s.progress.saturating_add(step).min(config.ceiling);
                    true
                });
            }
        });

        let previous = self
            .inner
            .ticker
            .lock()
            .expect("progress ticker poisoned")
            .replace((seq, handle));
        if let Some((_, previous)) = previous {
            previous.abort();
        }
    }

    /// Abort the ticker; with `Some(seq)` only if it belongs to that request.
    fn stop_ticker(&self, seq: Option<u64>) {
        let mut ticker = self.inner.ticker.lock().expect("progress ticker poisoned");
        let owned = match (&*ticker, seq) {
            (Some((running, _)), Some(seq)) => *running == seq,
            (Some(_), None) => true,
            (None, _) => false,
        };
        if owned && let Some((_, handle)) = ticker.take() {
            handle.abort();
        }
    }

    fn schedule_progress_reset(&self, seq: u64) {
        let state = Arc::clone(&self.inner.state);
        let delay = self.inner.progress.reset_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            state.send_if_modified(|s| {
                if s.request_seq != seq || !s.phase.is_terminal() || s.progress == 0 {
                    return false;
                }
                s.progress = 0;
                true
            });
        });
    }
}

/// Map a backend outcome to the stored result and the user-facing error.
fn interpret(
    outcome: Result<AnalysisResult, ClientError>,
    analysis_type: &str,
) -> (AnalysisResult, Option<String>) {
    match outcome {
        Ok(mut result) => {
            if result.analysis_type.is_none() {
                result.analysis_type = Some(analysis_type.to_string());
            }
            if result.success {
                return (result, None);
            }
            let message = result
                .error
                .clone()
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| ANALYSIS_FAILED_MESSAGE.to_string());
            (result, Some(message))
        }
        Err(ClientError::Remote(remote)) => {
            warn!(status = ?remote.status, detail = %remote.detail, "backend rejected analysis");
            let message = if remote.detail.trim().is_empty() {
                GENERIC_FAILURE_MESSAGE.to_string()
            } else {
                remote.detail
            };
            (
                AnalysisResult::failure(analysis_type, message.clone()),
                Some(message),
            )
        }
        Err(ClientError::Transport(err)) => {
            warn!(error = %err, "analysis request failed");
            (
                AnalysisResult::failure(analysis_type, NETWORK_ERROR),
                Some(GENERIC_FAILURE_MESSAGE.to_string()),
            )
        }
    }
}
