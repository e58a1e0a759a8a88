//! Domain records for the question board.

pub mod counters;
pub mod question;

pub use counters::*;
pub use question::*;
