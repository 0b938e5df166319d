//! Redemption state machine
//!
//! One redemption spans two independent webhook requests: the inbound
//! verification call (digits collected, code checked, outbound call
//! dispatched) and the outbound fulfillment call (audio played, use
//! recorded). No state lives in process memory between the two; the code
//! identifier rides along in the fulfillment callback URL, so a process
//! restart or a second instance can pick up the fulfillment leg.
//!
//! The verification-stage quota check is a fast pre-check for caller
//! feedback only. The authoritative decision is the quota enforcer's
//! conditional update at fulfillment time; a caller who redials before
//! fulfillment completes is just another concurrent consumer.

use crate::audio::{AudioResolver, RequestBase};
use crate::config::Config;
use crate::error::{GateError, Result};
use crate::quota::{ConsumeOutcome, QuotaEnforcer};
use crate::redemption::prompts;
use crate::store::{CodeStore, SerialCode};
use crate::telephony::{OutboundCall, OutboundDialer};
use crate::twiml::VoiceResponse;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Why a redemption attempt was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    CodeNotFound,
    QuotaExhausted,
    ProviderMisconfigured,
    DispatchFailed,
    ResourceResolutionFailed,
}

/// The states one redemption attempt moves through.
#[derive(Debug, Clone, PartialEq)]
pub enum Redemption {
    /// No usable digits yet; the caller is (re-)prompted.
    AwaitingCode,
    /// Digits collected, code being looked up.
    Verifying { digits: String, caller: String },
    /// Code accepted, outbound call being requested.
    Dispatching { code: SerialCode, caller: String },
    /// Inbound leg released; waiting for the provider to connect the
    /// outbound call and hit the fulfillment callback.
    AwaitingFulfillment { code: String },
    /// Fulfillment call connected, audio being resolved.
    Fulfilling { code: String },
    /// Fulfillment reply issued; `outcome` records what the authoritative
    /// consume said.
    Done { code: String, outcome: ConsumeOutcome },
    /// Terminal failure; exactly one spoken message was issued.
    Rejected { reason: RejectReason },
}

/// State plus the TwiML to send back to whichever call is live.
#[derive(Debug)]
pub struct FlowReply {
    pub state: Redemption,
    pub twiml: VoiceResponse,
}

/// Drives redemption attempts. All collaborators are passed in explicitly
/// so tests can swap the dialer (and point the store at a scratch
/// database).
#[derive(Clone)]
pub struct RedemptionFlow {
    store: CodeStore,
    enforcer: QuotaEnforcer,
    dialer: Arc<dyn OutboundDialer>,
    resolver: AudioResolver,
    from_number: Option<String>,
    consume_before_play: bool,
    language: String,
}

impl RedemptionFlow {
    pub fn new(
        store: CodeStore,
        enforcer: QuotaEnforcer,
        dialer: Arc<dyn OutboundDialer>,
        resolver: AudioResolver,
        config: &Config,
    ) -> Self {
        Self {
            store,
            enforcer,
            dialer,
            resolver,
            from_number: config.telephony.from_number.clone(),
            consume_before_play: config.redemption.consume_before_play,
            language: config.voice.language.clone(),
        }
    }

    /// Inbound verification leg: digits were collected on the inbound call.
    /// Verifies the code, dispatches the outbound call and releases the
    /// inbound leg. Never leaves the call without a final spoken message.
    pub async fn handle_digits(
        &self,
        digits: &str,
        caller: &str,
        base: Option<&RequestBase>,
    ) -> Result<FlowReply> {
        let attempt = Uuid::new_v4();
        let digits = digits.trim();

        if digits.is_empty() {
            info!("[{}] No digits collected; asking the caller to redial", attempt);
            return Ok(FlowReply {
                state: Redemption::AwaitingCode,
                twiml: self.say_hangup(prompts::NO_INPUT),
            });
        }

        let state = Redemption::Verifying {
            digits: digits.to_string(),
            caller: caller.to_string(),
        };
        debug!("[{}] {:?}", attempt, state);
        info!("[{}] Verifying serial code {} for caller {}", attempt, digits, caller);

        let code = match self.store.lookup(digits).await? {
            Some(code) => code,
            None => {
                warn!("[{}] Serial code {} not found", attempt, digits);
                return Ok(self.rejected(RejectReason::CodeNotFound, prompts::CODE_NOT_FOUND));
            }
        };

        if code.is_exhausted() {
            warn!(
                "[{}] Serial code {} exhausted at verification ({}/{})",
                attempt, code.code, code.usage_count, code.max_uses
            );
            return Ok(self.rejected(RejectReason::QuotaExhausted, prompts::QUOTA_EXHAUSTED));
        }

        let state = Redemption::Dispatching {
            code: code.clone(),
            caller: caller.to_string(),
        };
        debug!("[{}] {:?}", attempt, state);

        let Some(from) = self.from_number.as_deref().filter(|n| !n.is_empty()) else {
            error!("[{}] No outbound number configured; cannot dispatch", attempt);
            return Ok(self.rejected(RejectReason::ProviderMisconfigured, prompts::SYSTEM_ERROR));
        };

        let callback_url = match self
            .resolver
            .external_url(&format!("fulfill/{}", code.code), base)
        {
            Ok(url) => url,
            Err(e) => {
                error!("[{}] Cannot build fulfillment callback URL: {}", attempt, e);
                return Ok(self.rejected(RejectReason::DispatchFailed, prompts::DISPATCH_FAILED));
            }
        };

        let call = OutboundCall {
            to: caller.to_string(),
            from: from.to_string(),
            callback_url,
        };

        match self.dialer.place_call(&call).await {
            Ok(call_sid) => {
                info!(
                    "[{}] Outbound call {} dispatched via {}; releasing inbound leg",
                    attempt,
                    call_sid,
                    self.dialer.provider_name()
                );
                Ok(FlowReply {
                    state: Redemption::AwaitingFulfillment { code: code.code },
                    twiml: self.say_hangup(prompts::DISPATCH_OK),
                })
            }
            Err(GateError::ProviderMisconfigured) => {
                error!("[{}] Telephony provider is not configured", attempt);
                Ok(self.rejected(RejectReason::ProviderMisconfigured, prompts::SYSTEM_ERROR))
            }
            Err(e) => {
                error!("[{}] Outbound dispatch failed: {}", attempt, e);
                Ok(self.rejected(RejectReason::DispatchFailed, prompts::DISPATCH_FAILED))
            }
        }
    }

    /// Outbound fulfillment leg: the provider connected the callback call
    /// and handed back the correlated code. Plays the audio and records the
    /// use. This is the only place a use is ever recorded, and it runs at
    /// most once per fulfillment call.
    pub async fn handle_fulfillment(
        &self,
        code_id: &str,
        base: Option<&RequestBase>,
    ) -> Result<FlowReply> {
        let attempt = Uuid::new_v4();

        let state = Redemption::Fulfilling {
            code: code_id.to_string(),
        };
        debug!("[{}] {:?}", attempt, state);
        info!("[{}] Fulfillment call connected for code {}", attempt, code_id);

        let code = match self.store.lookup(code_id).await? {
            Some(code) => code,
            None => {
                warn!("[{}] Fulfillment callback for unknown code {}", attempt, code_id);
                return Ok(self.rejected(
                    RejectReason::CodeNotFound,
                    prompts::FULFILLMENT_MISSING_CODE,
                ));
            }
        };

        let audio_url = match self.resolver.resolve(&code.audio_url, base) {
            Ok(url) => url,
            Err(e) => {
                error!("[{}] Audio resolution failed for code {}: {}", attempt, code.code, e);
                return Ok(self.rejected(
                    RejectReason::ResourceResolutionFailed,
                    prompts::SYSTEM_ERROR,
                ));
            }
        };

        info!("[{}] Resolved audio {} for code {}", attempt, audio_url, code.code);

        if self.consume_before_play {
            // Fail-closed: the use must be recorded before any audio is
            // promised to the caller.
            return match self.enforcer.try_consume(&code.code).await? {
                ConsumeOutcome::Consumed { usage_count } => {
                    info!(
                        "[{}] Recorded use {}/{} for code {}",
                        attempt, usage_count, code.max_uses, code.code
                    );
                    Ok(FlowReply {
                        state: Redemption::Done {
                            code: code.code,
                            outcome: ConsumeOutcome::Consumed { usage_count },
                        },
                        twiml: VoiceResponse::new()
                            .play(&audio_url)
                            .say(&self.language, prompts::CLOSING)
                            .hangup(),
                    })
                }
                ConsumeOutcome::QuotaExhausted => {
                    warn!(
                        "[{}] Consume lost the race for code {}; withholding audio",
                        attempt, code.code
                    );
                    Ok(self.rejected(RejectReason::QuotaExhausted, prompts::QUOTA_EXHAUSTED))
                }
                ConsumeOutcome::NotFound => {
                    warn!("[{}] Code {} vanished before consumption", attempt, code.code);
                    Ok(self.rejected(
                        RejectReason::CodeNotFound,
                        prompts::FULFILLMENT_MISSING_CODE,
                    ))
                }
            };
        }

        // Fail-open (default): audio plays regardless; the authoritative
        // consume still runs exactly once, and a miss is an operator signal,
        // not a caller-facing failure.
        let outcome = self.enforcer.try_consume(&code.code).await?;
        match outcome {
            ConsumeOutcome::Consumed { usage_count } => {
                info!(
                    "[{}] Recorded use {}/{} for code {}",
                    attempt, usage_count, code.max_uses, code.code
                );
            }
            other => {
                warn!(
                    "[{}] Use was not recorded for code {}: {:?} (verification pre-check raced with consumption, or the quota changed mid-flight)",
                    attempt, code.code, other
                );
            }
        }

        Ok(FlowReply {
            state: Redemption::Done {
                code: code.code,
                outcome,
            },
            twiml: VoiceResponse::new()
                .play(&audio_url)
                .say(&self.language, prompts::CLOSING)
                .hangup(),
        })
    }

    fn rejected(&self, reason: RejectReason, text: &str) -> FlowReply {
        FlowReply {
            state: Redemption::Rejected { reason },
            twiml: self.say_hangup(text),
        }
    }

    fn say_hangup(&self, text: &str) -> VoiceResponse {
        VoiceResponse::new().say(&self.language, text).hangup()
    }
}
