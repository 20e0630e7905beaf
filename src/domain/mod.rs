mod budget;
pub mod money;
mod period;
mod planner;
mod reconciliation;
mod transaction;
mod user;
mod wellness;

pub use budget::*;
pub use money::*;
pub use period::*;
pub use planner::*;
pub use reconciliation::*;
pub use transaction::*;
pub use user::*;
pub use wellness::*;
