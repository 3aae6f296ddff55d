//! SCALE-like natural-number/struct codec for the accumulate data model
//! (partial state, implications, service accounts, deferred transfers).

mod impl_;

pub use impl_::*;
