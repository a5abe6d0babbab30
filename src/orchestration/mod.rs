//! Session layer: keeps history and live state in step.

pub mod session;

pub use session::LedgerSession;
