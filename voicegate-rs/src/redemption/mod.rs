/// Redemption protocol
///
/// Sequences one code redemption across the inbound verification call and
/// the outbound fulfillment call.

pub mod machine;
pub mod prompts;

pub use machine::{FlowReply, Redemption, RedemptionFlow, RejectReason};
