//! Race bookkeeping: status transitions and finish order.

mod rules;
mod standings;

pub use rules::{Judge, RaceRules};
pub use standings::Standings;
