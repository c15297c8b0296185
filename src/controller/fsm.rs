use crate::{Error, Result};
use tracing::{debug, warn};

/// Lifecycle of one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    Idle,
    Requesting,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestEvent {
    Submit,
    Resolved,
    Failed,
    Cancelled,
    /// Terminal outcome has been applied to the view.
    Settled,
}

#[derive(Debug)]
pub struct RequestStateMachine {
    phase: RequestPhase,
}

impl Default for RequestStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestStateMachine {
    pub fn new() -> Self {
        Self {
            phase: RequestPhase::Idle,
        }
    }

    pub fn current_phase(&self) -> RequestPhase {
        self.phase
    }

    pub fn transition(&mut self, event: RequestEvent) -> Result<RequestPhase> {
        let next = match (self.phase, event) {
            (RequestPhase::Idle, RequestEvent::Submit) => RequestPhase::Requesting,
            (RequestPhase::Requesting, RequestEvent::Resolved) => RequestPhase::Succeeded,
            (RequestPhase::Requesting, RequestEvent::Failed) => RequestPhase::Failed,
            (RequestPhase::Requesting, RequestEvent::Cancelled) => RequestPhase::Idle,
            (RequestPhase::Succeeded | RequestPhase::Failed, RequestEvent::Settled) => {
                RequestPhase::Idle
            }
            (current, requested) => {
                warn!(
                    "Invalid request transition from {:?} with event {:?}",
                    current, requested
                );
                return Err(Error::InvalidTransition {
                    current: format!("{:?}", current),
                    requested: format!("{:?}", requested),
                });
            }
        };

        debug!(
            "Request phase {:?} -> {:?} (event: {:?})",
            self.phase, next, event
        );
        self.phase = next;
        Ok(next)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, RequestPhase::Succeeded | RequestPhase::Failed)
    }

    pub fn is_in_flight(&self) -> bool {
        self.phase == RequestPhase::Requesting
    }
}
