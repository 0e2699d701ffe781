#![forbid(unsafe_code)]

//! Domain model for the internship tracker: identifiers, the internship
//! record row, document classification and verification rules.

mod classify;
mod ids;
mod naming;
mod record;
mod stats;

pub use classify::*;
pub use ids::*;
pub use naming::*;
pub use record::*;
pub use stats::*;

#[cfg(test)]
mod tests;
