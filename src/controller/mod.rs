pub mod fsm;
mod handle;
mod state;
mod surface;

pub use fsm::{RequestEvent, RequestPhase, RequestStateMachine};
pub use handle::Controller;
pub use state::{Answer, Outcome, Submission, ViewState};
pub use surface::{InputSurface, NoopSurface};
