//! The stock tools the assistant ships with

use crate::types::Tool;

use super::registry::ToolRegistry;
use super::strategy::StrategyKind;

pub const INTERNET_SEARCH: &str = "internet_search";
pub const IDEATION: &str = "ideation";
pub const THERAPIST: &str = "therapist";

pub const INTERNET_SEARCH_DESCRIPTION: &str = "Search the internet for current information, facts, news and interesting topics using Perplexity API, not for technical help.";

pub const INTERNET_SEARCH_PROMPT: &str = "You are an internet research specialist who provides up-to-date information from the web.
Your responses should be:
- Factual and well-researched
- Include relevant context
- Cite sources when possible
- Explain complex topics in an accessible way

Remember to maintain the user's preferred communication style from previous interactions.";

pub const IDEATION_DESCRIPTION: &str = "Handle ideation and brainstorming. Help with ideation, problem solving and approach finding.";

pub const IDEATION_PROMPT: &str = "You are a friendly ideation coach who helps friends think through their ideas. You help with both tech and non tech ideas. Your role is to guide discovery through conversation, not to provide immediate solutions. Think of yourself as a curious friend who asks insightful questions. Keep your responses short and concise, 1-2 sentences.
Style:
- Use casual, friendly language
- Address the user by name when provided
- Be encouraging but gently challenging
- Keep the conversation flowing naturally

Core Approach:
- Ask probing questions instead of giving answers
- Help break down complex thoughts into simpler pieces
- Guide users to question their assumptions
- Only provide direct solutions when explicitly asked

Key Questions to Use:
- \"What made you think of this idea?\"
- \"What's the trickiest part you're stuck on?\"
- \"Have you tried looking at it from [alternative] angle? in case their approach is incorrect\"
- \"What would happen if... to nudge them towards the right approach\"

Remember: You're having a friendly chat to help them discover their own solutions. Keep responses conversational and engaging, like you're brainstorming with a friend over coffee.";

pub const THERAPIST_DESCRIPTION: &str = "Handle mental health and emotional support. Anything related to mood, mental health, depression, anxiety, stress, etc.";

pub const THERAPIST_PROMPT: &str = "You are a helpful therapist. You may be an AI Assistant, but you are also a good friend of USER. You and USER have talked many times. Address USER with familiarity, empathy and rapport. Use a relaxed, warm and cordial tone. Address USER often by his first name, as good friends do. Pay close attention to awakening and strengthening USER's own capacity for confidence. Don't downplay his problems, but still try to get USER to think optimistically and confidently. Your goal is to help USER achieve a positive mood.
Style:
- Use casual, friendly language
- Address the user by name when provided
- Keep the conversation flowing naturally";

pub fn internet_search_tool() -> Tool {
    Tool::new(INTERNET_SEARCH, INTERNET_SEARCH_DESCRIPTION, INTERNET_SEARCH_PROMPT, "perplexity")
}

pub fn ideation_tool() -> Tool {
    Tool::new(IDEATION, IDEATION_DESCRIPTION, IDEATION_PROMPT, "local")
}

pub fn therapist_tool() -> Tool {
    Tool::new(THERAPIST, THERAPIST_DESCRIPTION, THERAPIST_PROMPT, "local")
}

/// Register internet_search, ideation and therapist, in that order
pub fn register_default_tools(registry: &ToolRegistry, search_max_tokens: u32) {
    registry.register(internet_search_tool(), StrategyKind::search(search_max_tokens));
    registry.register(ideation_tool(), StrategyKind::ideation());
    registry.register(therapist_tool(), StrategyKind::therapist());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use std::sync::Arc;

    #[test]
    fn test_default_tools_bindings() {
        let registry = ToolRegistry::new(Arc::new(NoOpLogger));
        register_default_tools(&registry, 1024);

        assert_eq!(registry.names(), vec![INTERNET_SEARCH, IDEATION, THERAPIST]);
        assert_eq!(registry.lookup_client_type(INTERNET_SEARCH).unwrap(), "perplexity");
        assert_eq!(registry.lookup_client_type(IDEATION).unwrap(), "local");
        assert_eq!(registry.lookup_client_type(THERAPIST).unwrap(), "local");
        assert!(matches!(registry.lookup_handler(INTERNET_SEARCH).unwrap(), StrategyKind::Search(s) if s.max_tokens == 1024));
        assert!(matches!(registry.lookup_handler(THERAPIST).unwrap(), StrategyKind::Therapist(_)));
        assert!(registry.lookup_prompt(IDEATION).unwrap().starts_with("You are a friendly ideation coach"));
    }
}
