//! Interview session management: state machine, registry, service boundary.

pub mod messages;
mod registry;
mod service;
mod session;

pub use messages::PhraseBook;
pub use registry::BatchEvent;
pub use service::Interviewer;
pub use session::{CandidateSession, Command, SessionStatus};
