//! Routable tools and the strategies that serve them
//!
//! ```text
//!   ToolRegistry ──name──▶ Tool { description, system_prompt, client_type }
//!        │
//!        └──name──▶ StrategyKind ──process(ToolInvocation)──▶ FragmentStream
//!                     ├─ Search     (token cap, citation stripping)
//!                     ├─ Ideation   (persona + reinforcement template)
//!                     ├─ Therapist  (persona + reinforcement template)
//!                     └─ Custom     (runtime closure)
//! ```

mod catalogue;
mod persona;
mod registry;
mod search;
mod strategy;

pub use catalogue::{
    ideation_tool, internet_search_tool, register_default_tools, therapist_tool, IDEATION,
    IDEATION_DESCRIPTION, IDEATION_PROMPT, INTERNET_SEARCH, INTERNET_SEARCH_DESCRIPTION,
    INTERNET_SEARCH_PROMPT, THERAPIST, THERAPIST_DESCRIPTION, THERAPIST_PROMPT,
};
pub use persona::{PersonaStrategy, ReinforcementTemplate};
pub use registry::ToolRegistry;
pub use search::{strip_citations, CitationStripper, SearchStrategy, DEFAULT_SEARCH_MAX_TOKENS};
pub use strategy::{text_fragments, CustomHandler, FragmentStream, StrategyKind, ToolInvocation};
