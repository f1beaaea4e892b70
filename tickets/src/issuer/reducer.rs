//! Reducer for the ticket presentation lifecycle.

use crate::encoder::encode_ticket;
use crate::issuer::{
    SessionId, TicketIssuerAction, TicketIssuerEnvironment, TicketIssuerState, TicketSession,
};
use crate::order_code::OrderCode;
use crate::payload::TicketPayload;
use eventhub_core::{async_effect, effect::Effect, reducer::Reducer};
use smallvec::{SmallVec, smallvec};

/// Reducer for the ticket issuer.
///
/// - `Open` draws the session's order code, freezes the payload and starts
///   the first encode.
/// - `Refresh` starts another encode for the same payload.
/// - `Close` drops the session.
/// - `ImageEncoded` is applied only if it answers the newest request of the
///   open session; anything else is stale and ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct TicketIssuerReducer;

impl TicketIssuerReducer {
    /// Create a new ticket issuer reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn encode_effect(
    session_id: SessionId,
    request: u64,
    payload: &TicketPayload,
    env: &TicketIssuerEnvironment,
) -> Effect<TicketIssuerAction> {
    let encoding = encode_ticket(env.encoder().as_ref(), payload, env.options());

    async_effect! {
        let image = encoding.await;
        Some(TicketIssuerAction::ImageEncoded { session_id, request, image })
    }
}

impl Reducer for TicketIssuerReducer {
    type State = TicketIssuerState;
    type Action = TicketIssuerAction;
    type Environment = TicketIssuerEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            TicketIssuerAction::Open {
                title,
                date,
                location,
            } => {
                if let Some(session) = state.session() {
                    tracing::debug!(
                        session_id = %session.id(),
                        "Ticket surface already open, ignoring open"
                    );
                    return smallvec![Effect::None];
                }

                let order_code = OrderCode::generate(env.order_codes());
                let payload = TicketPayload::build(order_code, title, date, location);
                let session = TicketSession::new(SessionId::new(), payload, env.clock().now());

                tracing::info!(
                    session_id = %session.id(),
                    order_code = %session.payload().order_code(),
                    title = session.payload().title(),
                    "Ticket surface opened"
                );
                metrics::counter!("tickets.sessions.opened").increment(1);

                let effect =
                    encode_effect(session.id(), session.latest_request(), session.payload(), env);
                state.open(session);
                smallvec![effect]
            }

            TicketIssuerAction::Refresh => {
                let Some(session) = state.session_mut() else {
                    tracing::debug!("Refresh while closed, ignoring");
                    return smallvec![Effect::None];
                };

                let request = session.begin_refresh();
                tracing::debug!(
                    session_id = %session.id(),
                    request,
                    "Refreshing ticket image"
                );
                smallvec![encode_effect(session.id(), request, session.payload(), env)]
            }

            TicketIssuerAction::Close => {
                if let Some(session) = state.close() {
                    tracing::info!(
                        session_id = %session.id(),
                        order_code = %session.payload().order_code(),
                        "Ticket surface closed"
                    );
                }
                smallvec![Effect::None]
            }

            TicketIssuerAction::ImageEncoded {
                session_id,
                request,
                image,
            } => {
                match state.session_mut() {
                    Some(session) if session.accepts(session_id, request) => {
                        tracing::debug!(
                            session_id = %session_id,
                            request,
                            ready = image.is_some(),
                            "Applying encode result"
                        );
                        session.resolve(image);
                    }
                    _ => {
                        metrics::counter!("tickets.encode.stale").increment(1);
                        tracing::debug!(
                            session_id = %session_id,
                            request,
                            "Discarding stale encode result"
                        );
                    }
                }
                smallvec![Effect::None]
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use crate::encoder::{EncodeOptions, QrTicketEncoder};
    use crate::issuer::IssuerPhase;
    use crate::mocks::{FailingEncoder, FixedOrderCodes};
    use eventhub_core::environment::Clock;
    use eventhub_testing::{ReducerTest, assertions, test_clock};
    use std::sync::Arc;

    fn env() -> TicketIssuerEnvironment {
        TicketIssuerEnvironment::new(
            Arc::new(test_clock()),
            Arc::new(FixedOrderCodes::new("AB12CD34")),
            Arc::new(FailingEncoder::default()),
            EncodeOptions::default(),
        )
    }

    fn open() -> TicketIssuerAction {
        TicketIssuerAction::Open {
            title: "Amapiano Festival".to_string(),
            date: "Dec 28, 2024".to_string(),
            location: "Cape Town Stadium".to_string(),
        }
    }

    fn open_state() -> TicketIssuerState {
        let mut state = TicketIssuerState::new();
        let _ = TicketIssuerReducer::new().reduce(&mut state, open(), &env());
        state
    }

    fn image() -> crate::encoder::EncodedTicketImage {
        let session = open_state();
        let payload = session.session().unwrap().payload().clone();
        QrTicketEncoder::render(&payload, &EncodeOptions::default()).unwrap()
    }

    #[test]
    fn test_open_starts_pending_session_and_encodes() {
        ReducerTest::new(TicketIssuerReducer::new())
            .with_env(env())
            .given_state(TicketIssuerState::new())
            .when_action(open())
            .then_state(|state| {
                assert_eq!(state.phase(), IssuerPhase::Pending);
                assert_eq!(state.order_code().unwrap().as_str(), "AB12CD34");
                assert!(state.image().is_none());
                let session = state.session().unwrap();
                assert_eq!(session.payload().title(), "Amapiano Festival");
                assert_eq!(session.opened_at(), test_clock().now());
                assert_eq!(session.latest_request(), 1);
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn test_open_while_open_keeps_session() {
        let state = open_state();
        let original = state.session().unwrap().id();

        ReducerTest::new(TicketIssuerReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(TicketIssuerAction::Open {
                title: "Other".to_string(),
                date: "Jan 1, 2025".to_string(),
                location: "Elsewhere".to_string(),
            })
            .then_state(move |state| {
                let session = state.session().unwrap();
                assert_eq!(session.id(), original);
                assert_eq!(session.payload().title(), "Amapiano Festival");
            })
            .then_effects(|effects| assertions::assert_no_effects(effects))
            .run();
    }

    #[test]
    fn test_refresh_keeps_payload_and_bumps_request() {
        let state = open_state();
        let code = state.order_code().cloned();

        ReducerTest::new(TicketIssuerReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(TicketIssuerAction::Refresh)
            .when_action(TicketIssuerAction::Refresh)
            .then_state(move |state| {
                assert_eq!(state.order_code().cloned(), code);
                assert_eq!(state.session().unwrap().latest_request(), 3);
                assert_eq!(state.phase(), IssuerPhase::Pending);
            })
            .then_effects(|effects| assertions::assert_has_future_effect(effects))
            .run();
    }

    #[test]
    fn test_refresh_while_closed_is_noop() {
        ReducerTest::new(TicketIssuerReducer::new())
            .with_env(env())
            .given_state(TicketIssuerState::new())
            .when_action(TicketIssuerAction::Refresh)
            .then_state(|state| assert!(state.is_closed()))
            .then_effects(|effects| assertions::assert_no_effects(effects))
            .run();
    }

    #[test]
    fn test_successful_result_makes_ready() {
        let state = open_state();
        let session_id = state.session().unwrap().id();
        let image = image();

        ReducerTest::new(TicketIssuerReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(TicketIssuerAction::ImageEncoded {
                session_id,
                request: 1,
                image: Some(image.clone()),
            })
            .then_state(move |state| {
                assert_eq!(state.phase(), IssuerPhase::Ready);
                assert_eq!(state.image(), Some(&image));
            })
            .run();
    }

    #[test]
    fn test_failed_result_shows_placeholder() {
        let state = open_state();
        let session_id = state.session().unwrap().id();

        ReducerTest::new(TicketIssuerReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(TicketIssuerAction::ImageEncoded {
                session_id,
                request: 1,
                image: None,
            })
            .then_state(|state| {
                assert_eq!(state.phase(), IssuerPhase::Failed);
                assert!(matches!(state.view(), crate::issuer::TicketView::Placeholder { .. }));
            })
            .run();
    }

    #[test]
    fn test_result_for_closed_session_is_discarded() {
        let state = open_state();
        let session_id = state.session().unwrap().id();
        let image = image();

        ReducerTest::new(TicketIssuerReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(TicketIssuerAction::Close)
            .when_action(TicketIssuerAction::ImageEncoded {
                session_id,
                request: 1,
                image: Some(image),
            })
            .then_state(|state| {
                assert!(state.is_closed());
                assert!(state.image().is_none());
                assert_eq!(state.view(), crate::issuer::TicketView::Closed);
            })
            .run();
    }

    #[test]
    fn test_superseded_result_is_discarded() {
        let state = open_state();
        let session_id = state.session().unwrap().id();

        ReducerTest::new(TicketIssuerReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(TicketIssuerAction::Refresh)
            .when_action(TicketIssuerAction::ImageEncoded {
                session_id,
                request: 1,
                image: None,
            })
            .then_state(|state| {
                // Request 2 is still outstanding.
                assert_eq!(state.phase(), IssuerPhase::Pending);
            })
            .run();
    }

    #[test]
    fn test_result_for_other_session_is_discarded() {
        let image = image();

        ReducerTest::new(TicketIssuerReducer::new())
            .with_env(env())
            .given_state(open_state())
            .when_action(TicketIssuerAction::ImageEncoded {
                session_id: SessionId::new(),
                request: 1,
                image: Some(image),
            })
            .then_state(|state| assert_eq!(state.phase(), IssuerPhase::Pending))
            .run();
    }
}
