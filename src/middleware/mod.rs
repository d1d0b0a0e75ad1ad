pub mod cookies;
pub mod session;

pub use session::{require_session, Session, SessionGate, SessionRejection};
