pub mod opportunity;
pub mod user;

pub use opportunity::{InvalidOpportunityId, Opportunity, OpportunityId, OpportunityInput};
pub use user::{NewUser, User, UserId};
