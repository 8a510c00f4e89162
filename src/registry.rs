//! Explicit plugin registry, filled by the composition root at startup.

use std::sync::Arc;

use anyhow::{bail, Result};

use crate::plugin::SqlitePlugin;

#[derive(Default, Clone)]
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn SqlitePlugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, plugin: Arc<dyn SqlitePlugin>) -> Result<()> {
        if self.get(plugin.name()).is_some() {
            bail!("plugin '{}' is already registered", plugin.name());
        }
        self.plugins.push(plugin);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn SqlitePlugin>> {
        self.plugins
            .iter()
            .find(|plugin| plugin.name() == name)
            .cloned()
    }

    pub fn plugins(&self) -> &[Arc<dyn SqlitePlugin>] {
        &self.plugins
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.plugins.iter().map(|plugin| plugin.name()).collect()
    }

    /// Plugins whose required tables are all present in `tables`.
    pub fn matching(&self, tables: &[String]) -> Vec<Arc<dyn SqlitePlugin>> {
        self.plugins
            .iter()
            .filter(|plugin| plugin.missing_tables(tables).is_empty())
            .cloned()
            .collect()
    }

    /// Keeps only the named plugins. Unknown names are an error.
    pub fn retain_named(&mut self, names: &[String]) -> Result<()> {
        if let Some(unknown) = names.iter().find(|name| self.get(name).is_none()) {
            bail!(
                "unknown plugin '{unknown}' (available: {})",
                self.names().join(", ")
            );
        }
        self.plugins
            .retain(|plugin| names.iter().any(|name| name == plugin.name()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledgec::KnowledgeCPlugin;

    fn tables(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = PluginRegistry::new();
        registry.register(Arc::new(KnowledgeCPlugin)).unwrap();
        assert!(registry.register(Arc::new(KnowledgeCPlugin)).is_err());
        assert_eq!(registry.names(), vec!["mac_knowledgec"]);
    }

    #[test]
    fn matching_requires_every_table() {
        let mut registry = PluginRegistry::new();
        registry.register(Arc::new(KnowledgeCPlugin)).unwrap();

        assert!(registry.matching(&tables(&["ZOBJECT"])).is_empty());
        assert_eq!(
            registry
                .matching(&tables(&["ZOBJECT", "ZSTRUCTUREDMETADATA", "ZSOURCE"]))
                .len(),
            1
        );
    }

    #[test]
    fn retain_named_rejects_unknown_names() {
        let mut registry = PluginRegistry::new();
        registry.register(Arc::new(KnowledgeCPlugin)).unwrap();

        assert!(registry.retain_named(&["chrome_history".to_string()]).is_err());
        registry
            .retain_named(&["mac_knowledgec".to_string()])
            .unwrap();
        assert_eq!(registry.plugins().len(), 1);
    }
}
