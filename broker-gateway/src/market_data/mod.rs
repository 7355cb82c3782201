//! Market-data session.
//!
//! `Disconnected -> Connecting -> LoggedIn -> ContractsLoaded -> Subscribed`,
//! with `Disconnected` re-entered on every unsolicited disconnect. Reconnects
//! are delayed tasks owned by the session actor, never blocking sleeps.

pub mod actor;
pub mod normalizer;
pub mod session;

pub use actor::{MdHandle, MdStatus};
pub use normalizer::{TickNormalizer, TickRejected};
pub use session::{MdPolicy, MdSession, MdState};
