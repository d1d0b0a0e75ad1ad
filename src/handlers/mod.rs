// handlers/mod.rs - Handler tiers
//
// Public (no session) -> Protected (session gate)
pub mod protected;
pub mod public;
pub mod system;
