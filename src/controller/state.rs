use chrono::{DateTime, Utc};

/// A successful model reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    pub received_at: DateTime<Utc>,
}

impl Answer {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            received_at: Utc::now(),
        }
    }
}

/// What the response area shows. A reply and an error never coexist.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Outcome {
    #[default]
    Idle,
    Success(Answer),
    Failed(String),
}

/// Everything a view needs to render the screen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub input: String,
    pub loading: bool,
    pub outcome: Outcome,
}

impl ViewState {
    pub fn response_text(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Success(answer) => Some(&answer.text),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// The text field and send control are disabled while a request is in flight.
    pub fn can_submit(&self) -> bool {
        !self.loading
    }
}

/// How a call to `Controller::submit` ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Blank input, nothing happened.
    Ignored,
    /// Another request holds the slot, or the controller is unmounted.
    Rejected,
    Answered(String),
    Failed(String),
    /// Superseded, cancelled or unmounted while in flight. State untouched.
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_initial_view_state_is_empty() {
        let state = ViewState::default();

        assert_eq!(state.input, "");
        assert!(!state.loading);
        assert_eq!(state.outcome, Outcome::Idle);
        assert!(state.can_submit());
    }

    #[test]
    fn test_outcome_accessors_are_exclusive() {
        let mut state = ViewState {
            outcome: Outcome::Success(Answer::new("试试火锅")),
            ..Default::default()
        };
        assert_eq!(state.response_text(), Some("试试火锅"));
        assert_eq!(state.error_message(), None);

        state.outcome = Outcome::Failed("API request failed: 500".to_string());
        assert_eq!(state.response_text(), None);
        assert_eq!(state.error_message(), Some("API request failed: 500"));
    }
}
