use super::{
    fsm::{RequestEvent, RequestPhase, RequestStateMachine},
    state::{Answer, Outcome, Submission, ViewState},
    surface::InputSurface,
};
use crate::{
    Result,
    config::{BusyPolicy, ControllerConfig},
    inference::InferenceClient,
};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// The single in-flight request.
struct Slot {
    id: Uuid,
    token: CancellationToken,
}

struct Inner {
    view: ViewState,
    fsm: RequestStateMachine,
    slot: Option<Slot>,
    mounted: bool,
}

/// Owns the screen state and the request/response lifecycle behind it.
///
/// Cloning yields another handle to the same state. At most one request is
/// in flight at a time; a second `submit` is rejected or supersedes the
/// first depending on [`BusyPolicy`].
#[derive(Clone)]
pub struct Controller {
    client: Arc<dyn InferenceClient>,
    surface: Arc<dyn InputSurface>,
    busy_policy: BusyPolicy,
    inner: Arc<Mutex<Inner>>,
    updates: Arc<watch::Sender<ViewState>>,
    root: CancellationToken,
}

impl Controller {
    pub fn mount(
        client: Arc<dyn InferenceClient>,
        surface: Arc<dyn InputSurface>,
        config: &ControllerConfig,
    ) -> Self {
        info!(
            "Mounting controller (busy policy: {:?})",
            config.busy_policy
        );

        let (updates, _) = watch::channel(ViewState::default());

        Self {
            client,
            surface,
            busy_policy: config.busy_policy,
            inner: Arc::new(Mutex::new(Inner {
                view: ViewState::default(),
                fsm: RequestStateMachine::new(),
                slot: None,
                mounted: true,
            })),
            updates: Arc::new(updates),
            root: CancellationToken::new(),
        }
    }

    pub fn state(&self) -> ViewState {
        self.lock().view.clone()
    }

    pub fn phase(&self) -> RequestPhase {
        self.lock().fsm.current_phase()
    }

    /// Receives a snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.updates.subscribe()
    }

    pub fn is_mounted(&self) -> bool {
        self.lock().mounted
    }

    /// Replaces the input text. Refused while loading or after unmount.
    pub fn set_input(&self, text: impl Into<String>) -> bool {
        let mut inner = self.lock();
        if !inner.mounted || inner.view.loading {
            return false;
        }
        inner.view.input = text.into();
        self.publish(&inner);
        true
    }

    /// Submits whatever the input field currently holds.
    pub async fn submit_input(&self) -> Submission {
        let text = self.lock().view.input.clone();
        self.submit(&text).await
    }

    /// Sends `text` to the inference endpoint and applies the result.
    ///
    /// An accepted submission takes over the input field: `text` becomes
    /// the input as typed, and is what a failed request leaves behind.
    /// Blank input is ignored without touching state. `LoadingFlag` is
    /// released on every exit path of a call that still owns the slot,
    /// including when this future is dropped or the client panics.
    pub async fn submit(&self, text: &str) -> Submission {
        let prompt = text.trim();
        if prompt.is_empty() {
            debug!("Ignoring blank submission");
            return Submission::Ignored;
        }

        let Some((request_id, token)) = self.begin(text) else {
            return Submission::Rejected;
        };

        self.surface.dismiss();

        let guard = SlotGuard {
            controller: self,
            request_id,
            armed: true,
        };

        info!(%request_id, "Submitting prompt");

        let result = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            result = self.client.generate(prompt) => Some(result),
        };

        // Whoever cancelled the token already took the slot
        match result {
            Some(result) => guard.complete(result),
            None => {
                debug!(%request_id, "Request cancelled while in flight");
                Submission::Cancelled
            }
        }
    }

    /// Cancels the in-flight request, if any. Outcome and input stay as they were.
    pub fn cancel(&self) -> bool {
        let mut inner = self.lock();
        let Some(slot) = inner.slot.take() else {
            return false;
        };

        info!(request_id = %slot.id, "Cancelling in-flight request");
        slot.token.cancel();
        inner.view.loading = false;
        transition(&mut inner.fsm, RequestEvent::Cancelled);
        self.publish(&inner);
        true
    }

    /// Tears the controller down. Outstanding work is cancelled and the
    /// state is frozen; later resolutions are discarded.
    pub fn unmount(&self) {
        let mut inner = self.lock();
        if !inner.mounted {
            return;
        }

        info!("Unmounting controller");
        inner.mounted = false;
        self.root.cancel();
        if let Some(slot) = inner.slot.take() {
            debug!(request_id = %slot.id, "Dropping in-flight request on unmount");
            inner.view.loading = false;
            transition(&mut inner.fsm, RequestEvent::Cancelled);
        }
        self.publish(&inner);
    }

    fn begin(&self, text: &str) -> Option<(Uuid, CancellationToken)> {
        let mut inner = self.lock();

        if !inner.mounted {
            warn!("Submission after unmount refused");
            return None;
        }

        if inner.slot.is_some() {
            match self.busy_policy {
                BusyPolicy::Reject => {
                    debug!("Request already in flight, rejecting submission");
                    return None;
                }
                BusyPolicy::Supersede => {
                    if let Some(slot) = inner.slot.take() {
                        info!(request_id = %slot.id, "Superseding in-flight request");
                        slot.token.cancel();
                    }
                    transition(&mut inner.fsm, RequestEvent::Cancelled);
                }
            }
        }

        if let Err(e) = inner.fsm.transition(RequestEvent::Submit) {
            error!("Cannot start request: {}", e);
            return None;
        }

        let request_id = Uuid::new_v4();
        let token = self.root.child_token();
        inner.slot = Some(Slot {
            id: request_id,
            token: token.clone(),
        });

        inner.view.input = text.to_string();
        inner.view.loading = true;
        if matches!(inner.view.outcome, Outcome::Failed(_)) {
            inner.view.outcome = Outcome::Idle;
        }
        self.publish(&inner);

        Some((request_id, token))
    }

    fn complete(&self, request_id: Uuid, result: Result<String>) -> Submission {
        let mut inner = self.lock();

        if !owns_slot(&inner, request_id) {
            debug!(%request_id, "Request no longer owns the slot, discarding result");
            return Submission::Cancelled;
        }

        inner.slot = None;
        inner.view.loading = false;

        let submission = match result {
            Ok(text) => {
                info!(%request_id, "Received response ({} chars)", text.chars().count());
                transition(&mut inner.fsm, RequestEvent::Resolved);
                inner.view.outcome = Outcome::Success(Answer::new(text.clone()));
                inner.view.input.clear();
                Submission::Answered(text)
            }
            Err(e) => {
                if e.is_inference_failure() {
                    warn!(%request_id, "Inference call failed: {}", e);
                } else {
                    error!(%request_id, "Submission failed: {}", e);
                }
                transition(&mut inner.fsm, RequestEvent::Failed);
                let message = e.to_string();
                inner.view.outcome = Outcome::Failed(message.clone());
                Submission::Failed(message)
            }
        };

        if inner.fsm.is_terminal() {
            transition(&mut inner.fsm, RequestEvent::Settled);
        }
        self.publish(&inner);

        submission
    }

    /// Frees the slot of a submission that never reached `complete`.
    fn release(&self, request_id: Uuid) {
        let mut inner = self.lock();
        if !owns_slot(&inner, request_id) {
            return;
        }

        warn!(%request_id, "Submission abandoned, releasing in-flight slot");
        inner.slot = None;
        inner.view.loading = false;
        transition(&mut inner.fsm, RequestEvent::Cancelled);
        self.publish(&inner);
    }

    fn publish(&self, inner: &Inner) {
        self.updates.send_replace(inner.view.clone());
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Releases the slot if the submission future is dropped or unwinds.
struct SlotGuard<'a> {
    controller: &'a Controller,
    request_id: Uuid,
    armed: bool,
}

impl SlotGuard<'_> {
    fn complete(mut self, result: Result<String>) -> Submission {
        self.armed = false;
        self.controller.complete(self.request_id, result)
    }
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.controller.release(self.request_id);
        }
    }
}

fn owns_slot(inner: &Inner, request_id: Uuid) -> bool {
    inner
        .slot
        .as_ref()
        .is_some_and(|slot| slot.id == request_id)
}

fn transition(fsm: &mut RequestStateMachine, event: RequestEvent) {
    if let Err(e) = fsm.transition(event) {
        error!("Request state machine out of sync: {}", e);
    }
}
