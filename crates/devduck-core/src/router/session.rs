//! Per-session routing context

/// Caller-owned state for one conversation
///
/// The routing hint is the tool selected on the previous turn. It is passed
/// to the classifier so a follow-up stays with the same tool, and it is
/// updated as soon as a tool is selected, before the reply is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    session_id: String,
    routing_hint: Option<String>,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            routing_hint: None,
        }
    }

    /// Start with a known previous tool
    pub fn with_hint(mut self, tool: impl Into<String>) -> Self {
        self.routing_hint = Some(tool.into());
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn routing_hint(&self) -> Option<&str> {
        self.routing_hint.as_deref()
    }

    pub(crate) fn set_routing_hint(&mut self, tool: impl Into<String>) {
        self.routing_hint = Some(tool.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_context() {
        let mut ctx = SessionContext::new("s1");
        assert_eq!(ctx.session_id(), "s1");
        assert_eq!(ctx.routing_hint(), None);

        ctx.set_routing_hint("therapist");
        assert_eq!(ctx.routing_hint(), Some("therapist"));

        let ctx = SessionContext::new("s2").with_hint("ideation");
        assert_eq!(ctx.routing_hint(), Some("ideation"));
    }
}
