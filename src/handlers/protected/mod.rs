// handlers/protected/mod.rs - Protected handlers (session required)
//
// Every route in this module is mounted behind `middleware::require_session`,
// so handlers can rely on a `Session` extension being present. The owner a
// handler acts for is always the session user.

pub mod opportunity;

pub use opportunity::add as opportunity_add;
pub use opportunity::delete_all as opportunities_delete_all;
pub use opportunity::delete_one as opportunity_delete;
pub use opportunity::list as opportunities_list;
pub use opportunity::list_mine as opportunities_list_mine;
pub use opportunity::update as opportunity_update;
