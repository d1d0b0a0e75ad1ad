// handlers/public/mod.rs - Public handlers (no session required)
//
// Account endpoints that establish a session, and the single-record lookup
// which is reachable without one.

pub mod auth;
pub mod opportunity;

pub use auth::{login, logout, signup};
pub use opportunity::get as opportunity_get;
