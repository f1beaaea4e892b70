//! Test doubles for the issuer environment.
//!
//! Deterministic order code sources and encoders whose outcome and timing
//! are scripted per call.

use crate::encoder::{EncodeError, EncodeFuture, EncodeOptions, QrTicketEncoder, TicketEncoder};
use crate::order_code::OrderCodeSource;
use crate::payload::TicketPayload;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Notify;

/// Order code source that always returns the same token.
#[derive(Debug, Clone)]
pub struct FixedOrderCodes {
    token: String,
}

impl FixedOrderCodes {
    /// Always hand out `token`.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl OrderCodeSource for FixedOrderCodes {
    fn next_token(&self, _len: usize) -> String {
        self.token.clone()
    }
}

/// Order code source cycling through a list of tokens.
#[derive(Debug)]
pub struct SequenceOrderCodes {
    tokens: Vec<String>,
    next: AtomicUsize,
}

impl SequenceOrderCodes {
    /// Hand out `tokens` in order, wrapping around at the end.
    #[must_use]
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
            next: AtomicUsize::new(0),
        }
    }

    /// Number of tokens handed out so far
    #[must_use]
    pub fn draws(&self) -> usize {
        self.next.load(Ordering::SeqCst)
    }
}

impl OrderCodeSource for SequenceOrderCodes {
    fn next_token(&self, _len: usize) -> String {
        let index = self.next.fetch_add(1, Ordering::SeqCst);
        if self.tokens.is_empty() {
            return String::new();
        }
        self.tokens[index % self.tokens.len()].clone()
    }
}

/// Encoder that always fails.
#[derive(Debug, Clone, Default)]
pub struct FailingEncoder {
    calls: Arc<AtomicUsize>,
}

impl FailingEncoder {
    /// Number of encode calls
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TicketEncoder for FailingEncoder {
    fn encode(&self, _payload: &TicketPayload, _options: &EncodeOptions) -> EncodeFuture {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { Err(EncodeError::Injected("encoder unavailable".to_string())) })
    }
}

/// Outcome of one scripted encode call.
#[derive(Debug, Clone)]
pub enum EncodeStep {
    /// Render for real, immediately
    Succeed,
    /// Fail immediately
    Fail,
    /// Wait for the gate, then render
    SucceedAfter(Arc<Notify>),
    /// Wait for the gate, then fail
    FailAfter(Arc<Notify>),
}

impl EncodeStep {
    /// A gate to pass to the `*After` steps.
    #[must_use]
    pub fn gate() -> Arc<Notify> {
        Arc::new(Notify::new())
    }
}

/// Encoder following a script, one step per call.
///
/// Calls beyond the script succeed immediately. Every payload it is asked
/// to encode is recorded.
#[derive(Debug, Default)]
pub struct ScriptedEncoder {
    steps: Mutex<VecDeque<EncodeStep>>,
    payloads: Mutex<Vec<TicketPayload>>,
}

impl ScriptedEncoder {
    /// Encoder running `steps` in order.
    #[must_use]
    pub fn new(steps: impl IntoIterator<Item = EncodeStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            payloads: Mutex::new(Vec::new()),
        }
    }

    /// Number of encode calls
    #[must_use]
    pub fn calls(&self) -> usize {
        self.payloads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Payloads passed to encode, in call order
    #[must_use]
    pub fn payloads(&self) -> Vec<TicketPayload> {
        self.payloads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl TicketEncoder for ScriptedEncoder {
    fn encode(&self, payload: &TicketPayload, options: &EncodeOptions) -> EncodeFuture {
        self.payloads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(payload.clone());
        let step = self
            .steps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(EncodeStep::Succeed);

        let payload = payload.clone();
        let options = options.clone();
        Box::pin(async move {
            let succeed = match step {
                EncodeStep::Succeed => true,
                EncodeStep::Fail => false,
                EncodeStep::SucceedAfter(gate) => {
                    gate.notified().await;
                    true
                }
                EncodeStep::FailAfter(gate) => {
                    gate.notified().await;
                    false
                }
            };

            if succeed {
                QrTicketEncoder::render(&payload, &options)
            } else {
                Err(EncodeError::Injected("scripted failure".to_string()))
            }
        })
    }
}
