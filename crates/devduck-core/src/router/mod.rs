//! Tool-selection router with session-scoped history
//!
//! ```text
//! route(ctx, text)
//!   ├─ claim session            (SessionBusy if an exchange is in flight)
//!   ├─ classify                 (unknown name / failure → default tool)
//!   ├─ update routing hint
//!   ├─ seed (session, tool)     (system prompt, first use only)
//!   ├─ strategy.process         (first fragment awaited; failure → one retry
//!   │                            with the default tool)
//!   └─ Exchange                 (caller drains, then commits)
//! ```

mod classifier;
mod core;
mod exchange;
mod history;
mod session;

pub use self::classifier::{parse_selection, Classifier};
pub use self::core::{Router, RouterBuilder};
pub use self::exchange::{Exchange, FallbackReason};
pub use self::history::{BucketState, ConversationStore};
pub use self::session::SessionContext;
