//! Registry for all provider plugins and the municipalities they serve.

use std::collections::HashMap;
use std::sync::Arc;

use crate::model::{ProviderId, ProviderMeta};
use crate::ports::Provider;

/// Provider implementation together with the municipalities routed to it.
pub struct ProviderPlugin {
    /// Static metadata describing the provider.
    pub meta: ProviderMeta,
    /// Canonical municipality names (without "kommun") served by this provider.
    pub kommuner: Vec<String>,
    /// Implementation talking to the live endpoint.
    pub live: Arc<dyn Provider>,
    /// Implementation serving the bundled demo fixture.
    pub demo: Arc<dyn Provider>,
}

impl ProviderPlugin {
    /// Pick the live or the demo implementation.
    #[must_use]
    pub fn provider(&self, use_demo_data: bool) -> Arc<dyn Provider> {
        if use_demo_data {
            Arc::clone(&self.demo)
        } else {
            Arc::clone(&self.live)
        }
    }
}

/// Registry that resolves providers by municipality name.
pub struct PluginRegistry {
    plugins: HashMap<ProviderId, ProviderPlugin>,
    routes: HashMap<String, ProviderId>,
}

impl PluginRegistry {
    /// Build a registry from the provided plugin list.
    ///
    /// A municipality listed by more than one plugin is routed to the last one.
    #[must_use]
    pub fn new(plugins: Vec<ProviderPlugin>) -> Self {
        let mut routes = HashMap::new();
        for plugin in &plugins {
            for kommun in &plugin.kommuner {
                if let Some(previous) = routes.insert(kommun.clone(), plugin.meta.id.clone()) {
                    tracing::warn!(%kommun, %previous, "municipality routed to more than one provider");
                }
            }
        }

        let plugins = plugins
            .into_iter()
            .map(|plugin| (plugin.meta.id.clone(), plugin))
            .collect();

        Self { plugins, routes }
    }

    /// All routed municipality names, sorted.
    #[must_use]
    pub fn kommuner(&self) -> Vec<String> {
        let mut names: Vec<String> = self.routes.keys().cloned().collect();
        names.sort();
        names
    }

    /// Look up the plugin serving a municipality.
    ///
    /// Returns `None` for unsupported municipalities; that is an expected outcome
    /// during setup rather than a fault.
    #[must_use]
    pub fn plugin_for(&self, kommun: &str) -> Option<&ProviderPlugin> {
        kommun_variants(kommun)
            .iter()
            .find_map(|variant| self.routes.get(variant))
            .and_then(|id| self.plugins.get(id))
    }

    /// Resolve the provider for a municipality, or `None` when it is unsupported.
    #[must_use]
    pub fn resolve(&self, kommun: &str, use_demo_data: bool) -> Option<Arc<dyn Provider>> {
        self.plugin_for(kommun)
            .map(|plugin| plugin.provider(use_demo_data))
    }
}

/// Names a municipality may be registered under.
///
/// Besides the trimmed input, a genitive form such as "Helsingborgs" also tries
/// the name without its trailing "s".
fn kommun_variants(kommun: &str) -> Vec<String> {
    let kommun = kommun.trim();
    let mut variants = vec![kommun.to_owned()];
    if let Some(stem) = kommun.strip_suffix('s')
        && !stem.is_empty()
    {
        variants.push(stem.to_owned());
    }
    variants
}
