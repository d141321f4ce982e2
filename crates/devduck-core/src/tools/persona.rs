//! Persona strategies (ideation, therapist) and their reinforcement templates

use crate::providers::{ProviderResult, StreamChatOptions};

use super::strategy::{text_fragments, FragmentStream, ToolInvocation};

/// Instruction wrapped around the outgoing user turn
///
/// The stored system turn drifts out of focus as a transcript grows; the
/// template restates the persona next to every new utterance. Only the
/// outgoing request sees it. History keeps the raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReinforcementTemplate {
    name: String,
    template: String,
}

impl ReinforcementTemplate {
    /// Placeholder replaced by the user's text
    pub const PLACEHOLDER: &'static str = "{text}";

    /// A template without the placeholder gets the text prepended
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn apply(&self, text: &str) -> String {
        if self.template.contains(Self::PLACEHOLDER) {
            self.template.replace(Self::PLACEHOLDER, text)
        } else {
            format!("{}\n\n{}", text, self.template)
        }
    }

    pub fn ideation() -> Self {
        Self::new(
            "ideation",
            "{text}\n\n(Stay in your role as a friendly ideation coach: reply in 1-2 \
             casual sentences and ask a guiding question instead of handing over a solution, \
             unless a solution is explicitly asked for.)",
        )
    }

    pub fn therapist() -> Self {
        Self::new(
            "therapist",
            "{text}\n\n(Stay in your role as USER's warm, familiar friend and therapist: \
             be empathetic, don't downplay the problem, and help USER feel confident and \
             optimistic.)",
        )
    }
}

/// One call to the tool's backend with the persona restated in the user turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonaStrategy {
    pub template: ReinforcementTemplate,
}

impl PersonaStrategy {
    pub fn new(template: ReinforcementTemplate) -> Self {
        Self { template }
    }

    pub fn ideation() -> Self {
        Self::new(ReinforcementTemplate::ideation())
    }

    pub fn therapist() -> Self {
        Self::new(ReinforcementTemplate::therapist())
    }

    pub async fn process(&self, invocation: ToolInvocation) -> ProviderResult<FragmentStream> {
        let messages = invocation.messages_with(self.template.apply(&invocation.text));
        let stream = invocation
            .client
            .stream_chat(messages, None, StreamChatOptions::new(), invocation.cancel.clone())
            .await?;
        Ok(text_fragments(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::ClientHandle;
    use crate::logging::NoOpLogger;
    use crate::providers::MockProvider;
    use crate::types::{BackendConfig, CancellationToken, ChatMessage, MessageRole, Tool};
    use futures::StreamExt;
    use std::sync::Arc;

    #[test]
    fn test_template_apply() {
        let template = ReinforcementTemplate::new("short", "{text} (be brief)");
        assert_eq!(template.apply("hello"), "hello (be brief)");
        assert_eq!(template.name(), "short");

        let suffix_only = ReinforcementTemplate::new("suffix", "Be brief.");
        assert_eq!(suffix_only.apply("hello"), "hello\n\nBe brief.");
    }

    #[test]
    fn test_builtin_templates_keep_text_first() {
        for template in [ReinforcementTemplate::ideation(), ReinforcementTemplate::therapist()] {
            let applied = template.apply("I have an idea");
            assert!(applied.starts_with("I have an idea\n\n("));
            assert!(!applied.contains(ReinforcementTemplate::PLACEHOLDER));
        }
    }

    #[tokio::test]
    async fn test_persona_reinforces_outgoing_turn_only() {
        let mock = Arc::new(MockProvider::fixed("What made you think of that?", Arc::new(NoOpLogger)));
        let client = ClientHandle::new(
            BackendConfig::new("local").with_models(vec!["llama-3.2-3b-instruct".to_string()]),
            mock.clone(),
        );
        let history = vec![
            ChatMessage::system("You are a coach."),
            ChatMessage::user("earlier"),
            ChatMessage::assistant("earlier reply"),
        ];
        let invocation = ToolInvocation {
            tool: Tool::new("ideation", "Brainstorm", "You are a coach.", "local"),
            text: "an app for ducks".to_string(),
            history: history.clone(),
            client: Arc::new(client),
            cancel: CancellationToken::new(),
        };

        let strategy = PersonaStrategy::ideation();
        let text: String = strategy
            .process(invocation)
            .await
            .unwrap()
            .map(|f| f.unwrap())
            .collect::<Vec<_>>()
            .await
            .concat();
        assert_eq!(text, "What made you think of that?");

        let request = mock.last_request().unwrap();
        assert_eq!(request.messages.len(), 4);
        assert_eq!(&request.messages[..3], &history[..]);
        let outgoing = &request.messages[3];
        assert_eq!(outgoing.role, MessageRole::User);
        assert_eq!(outgoing.content, strategy.template.apply("an app for ducks"));
        assert_eq!(request.max_tokens, None);
    }
}
