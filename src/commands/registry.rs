//! Command handler registry
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use std::collections::HashMap;
use std::sync::Arc;

use super::handler::ChatCommandHandler;

/// Registry mapping command names to handlers
///
/// A handler registers under every name it declares, so related commands
/// (`newgoal`/`mygoals`) can share one handler.
#[derive(Clone, Default)]
pub struct CommandRegistry {
    handlers: HashMap<&'static str, Arc<dyn ChatCommandHandler>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for its declared command names.
    pub fn register(&mut self, handler: Arc<dyn ChatCommandHandler>) {
        for name in handler.command_names() {
            self.handlers.insert(name, Arc::clone(&handler));
        }
    }

    /// Look up the handler for a command name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ChatCommandHandler>> {
        self.handlers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Number of registered command names (not unique handlers).
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// All registered command names.
    pub fn command_names(&self) -> impl Iterator<Item = &&'static str> {
        self.handlers.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::context::CommandContext;
    use anyhow::Result;
    use async_trait::async_trait;
    use serenity::model::channel::Message;
    use serenity::prelude::Context;

    struct MockHandler {
        names: &'static [&'static str],
    }

    #[async_trait]
    impl ChatCommandHandler for MockHandler {
        fn command_names(&self) -> &'static [&'static str] {
            self.names
        }

        fn descriptions(&self) -> &'static [(&'static str, &'static str)] {
            &[]
        }

        async fn handle(
            &self,
            _ctx: Arc<CommandContext>,
            _serenity_ctx: &Context,
            _msg: &Message,
            _command: &str,
            _args: &str,
        ) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_registry_new_is_empty() {
        let registry = CommandRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_register_all_declared_names() {
        let mut registry = CommandRegistry::new();
        registry.register(Arc::new(MockHandler {
            names: &["newgoal", "mygoals"],
        }));

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("newgoal"));
        assert!(registry.contains("mygoals"));
        assert!(registry.get("newgoal").is_some());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_later_registration_wins() {
        let mut registry = CommandRegistry::new();
        registry.register(Arc::new(MockHandler { names: &["x"] }));
        registry.register(Arc::new(MockHandler { names: &["x", "y"] }));
        assert_eq!(registry.len(), 2);
    }
}
