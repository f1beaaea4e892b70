//! The ticket presentation lifecycle.
//!
//! ```text
//!            open                  encode ok
//!  Closed ─────────▶ Pending ───────────────▶ Ready
//!    ▲                  │  ▲                    │
//!    │        encode err│  └──── refresh ───────┤
//!    │                  ▼                       │
//!    │               Failed ◀── refresh ────────┘ (via Pending)
//!    └──────────────── close (from any open phase)
//! ```
//!
//! Each open creates a session with a fresh order code and a payload that
//! stays fixed until close. Every encode request carries the session id and
//! a request number; only the answer to the newest request of the current
//! session is applied.

mod actions;
mod environment;
mod reducer;
mod store;
mod types;

pub use actions::TicketIssuerAction;
pub use environment::TicketIssuerEnvironment;
pub use reducer::TicketIssuerReducer;
pub use store::TicketIssuer;
pub use types::{IssuerPhase, SessionId, TicketIssuerState, TicketSession, TicketView};
