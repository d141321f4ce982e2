//! Tool registry
//!
//! Holds the routable tools in registration order and maps each name to the
//! strategy that handles it. The capability list handed to the classifier is
//! derived from the same order, so it is stable across calls until the
//! registry changes.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{RouterError, RouterResult};
use crate::{log_debug, log_info};
use crate::logging::Logger;
use crate::types::{Tool, ToolSchema};

use super::strategy::StrategyKind;

#[derive(Debug, Clone)]
struct ToolEntry {
    tool: Tool,
    strategy: StrategyKind,
}

/// Insertion-ordered, last-write-wins tool catalogue
pub struct ToolRegistry {
    entries: RwLock<Vec<ToolEntry>>,
    logger: Arc<dyn Logger>,
}

impl ToolRegistry {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            logger,
        }
    }

    /// Register `tool` with its handler
    ///
    /// Re-registering a name replaces the descriptor and handler but keeps
    /// the tool's original position in the capability list.
    pub fn register(&self, tool: Tool, strategy: StrategyKind) {
        let mut entries = self.entries.write();
        log_debug!(
            self.logger,
            "[ToolRegistry] Registering {} ({} on {})",
            tool.name,
            strategy.label(),
            tool.client_type
        );

        match entries.iter_mut().find(|e| e.tool.name == tool.name) {
            Some(existing) => {
                log_info!(self.logger, "[ToolRegistry] Replacing tool {}", tool.name);
                *existing = ToolEntry { tool, strategy };
            }
            None => entries.push(ToolEntry { tool, strategy }),
        }
    }

    /// Build the descriptor and register it in one step
    pub fn register_tool(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
        system_prompt: impl Into<String>,
        client_type: impl Into<String>,
        strategy: StrategyKind,
    ) {
        self.register(Tool::new(name, description, system_prompt, client_type), strategy);
    }

    /// One `{name, description, input-schema}` entry per tool, in registration order
    pub fn capability_list(&self) -> Vec<ToolSchema> {
        self.entries.read().iter().map(|e| e.tool.to_schema()).collect()
    }

    pub fn lookup_tool(&self, name: &str) -> RouterResult<Tool> {
        self.with_entry(name, |e| e.tool.clone())
    }

    pub fn lookup_handler(&self, name: &str) -> RouterResult<StrategyKind> {
        self.with_entry(name, |e| e.strategy.clone())
    }

    pub fn lookup_prompt(&self, name: &str) -> RouterResult<String> {
        self.with_entry(name, |e| e.tool.system_prompt.clone())
    }

    /// Name of the backend the tool is bound to
    pub fn lookup_client_type(&self, name: &str) -> RouterResult<String> {
        self.with_entry(name, |e| e.tool.client_type.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().iter().any(|e| e.tool.name == name)
    }

    /// Tool names in registration order
    pub fn names(&self) -> Vec<String> {
        self.entries.read().iter().map(|e| e.tool.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn with_entry<T>(&self, name: &str, f: impl FnOnce(&ToolEntry) -> T) -> RouterResult<T> {
        self.entries
            .read()
            .iter()
            .find(|e| e.tool.name == name)
            .map(f)
            .ok_or_else(|| RouterError::UnknownTool(name.to_string()))
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry").field("tools", &self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;

    fn registry() -> ToolRegistry {
        ToolRegistry::new(Arc::new(NoOpLogger))
    }

    #[test]
    fn test_capability_list_order_and_stability() {
        let registry = registry();
        registry.register_tool("internet_search", "Search the web", "You research.", "perplexity", StrategyKind::search(1024));
        registry.register_tool("ideation", "Brainstorm", "You coach.", "local", StrategyKind::ideation());
        registry.register_tool("therapist", "Support", "You care.", "local", StrategyKind::therapist());

        let first = registry.capability_list();
        let names: Vec<&str> = first.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["internet_search", "ideation", "therapist"]);
        assert_eq!(first[0].description, "Search the web");
        assert!(first.iter().all(|c| c.input_schema.is_some()));

        for _ in 0..3 {
            assert_eq!(registry.capability_list(), first);
        }
    }

    #[test]
    fn test_last_write_wins_keeps_position() {
        let registry = registry();
        registry.register_tool("ideation", "old", "old prompt", "local", StrategyKind::ideation());
        registry.register_tool("therapist", "Support", "You care.", "local", StrategyKind::therapist());
        registry.register_tool("ideation", "new", "new prompt", "remote", StrategyKind::search(64));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["ideation", "therapist"]);
        assert_eq!(registry.lookup_prompt("ideation").unwrap(), "new prompt");
        assert_eq!(registry.lookup_client_type("ideation").unwrap(), "remote");
        assert!(matches!(registry.lookup_handler("ideation").unwrap(), StrategyKind::Search(_)));
        assert_eq!(registry.capability_list().len(), 2);
    }

    #[test]
    fn test_unknown_tool() {
        let registry = registry();
        assert!(registry.is_empty());
        assert!(matches!(registry.lookup_handler("ghost"), Err(RouterError::UnknownTool(n)) if n == "ghost"));
        assert!(matches!(registry.lookup_prompt("ghost"), Err(RouterError::UnknownTool(_))));
        assert!(matches!(registry.lookup_client_type("ghost"), Err(RouterError::UnknownTool(_))));
        assert!(!registry.contains("ghost"));
    }
}
