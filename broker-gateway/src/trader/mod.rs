//! Trading session.
//!
//! Order entry and cancellation, the live order cache, and the position,
//! account and option-contract snapshots built from query responses.

pub mod actor;
pub mod aggregator;
pub mod decode;
pub mod reconciler;
pub mod request;
pub mod session;

pub use actor::{TdHandle, TdQuery, TdStatus};
pub use aggregator::{AccountKind, ShortPositionAccumulator};
pub use reconciler::{FillOutcome, OrderReconciler, OrderUpdate, ReconcileError};
pub use request::{encode_order, AccountFlags};
pub use session::{TdSession, TdState};

#[cfg(test)]
mod tests;
