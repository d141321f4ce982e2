//! Named backend connections
//!
//! The `ClientManager` maps logical backend names ("local", "perplexity") to
//! `ClientHandle`s. Tools refer to backends only by name, so a config change
//! never touches the tool catalogue.

mod manager;

pub use manager::{ClientHandle, ClientManager};
