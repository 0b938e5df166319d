/// Quota enforcement for serial codes
///
/// The single authority allowed to move a code's usage count upward. All
/// redemption paths funnel through [`QuotaEnforcer::try_consume`].

pub mod enforcer;

pub use enforcer::{ConsumeOutcome, QuotaEnforcer};
