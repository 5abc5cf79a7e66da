//! Capacity-constrained signup reconciliation for a chat-driven event desk.
//!
//! The core loop: a parsed [`Command`] maps onto [`engine::reconcile`]
//! calls against a [`rollcall_store::LedgerStore`]; the engine keeps the
//! global invariant "sum of approved seats <= capacity" true after every
//! mutation, and [`engine::promote_waitlist`] cascades promotions whenever
//! capacity frees up. [`SignupDesk`] wires the pieces together behind one
//! `handle` entry point.
//!
//! The engine's read-modify-write sequence assumes exclusive access to the
//! ledger for its duration; callers serialize commands (one lock per
//! deployment).

pub mod command;
pub mod desk;
pub mod engine;
pub mod error;
pub mod reply;
pub mod settings;
pub mod summary;

pub use command::Command;
pub use desk::{PROXY_ID_PREFIX, SignupDesk, proxy_id};
pub use engine::{ReconcileOutcome, promote_waitlist, reconcile};
pub use error::SignupError;
pub use settings::Settings;
pub use summary::render_summary;
