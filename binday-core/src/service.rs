//! High-level service facade combining all providers.

use std::sync::Arc;

use crate::model::{AddressMatch, ScheduleSnapshot};
use crate::plugin::PluginRegistry;
use crate::ports::{FetchRequest, Provider, ProviderError};

/// Public entry point for searching properties and fetching schedules.
pub struct BindayService {
    registry: Arc<PluginRegistry>,
    use_demo_data: bool,
}

impl BindayService {
    /// Create a new service bound to the provided registry.
    #[must_use]
    pub fn new(registry: Arc<PluginRegistry>, use_demo_data: bool) -> Self {
        Self {
            registry,
            use_demo_data,
        }
    }

    /// Municipalities that have a routed provider.
    #[must_use]
    pub fn kommuner(&self) -> Vec<String> {
        self.registry.kommuner()
    }

    /// Resolve the provider for a municipality.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::UnsupportedKommun`] when no provider is routed.
    pub fn provider_for(&self, kommun: &str) -> Result<Arc<dyn Provider>, ProviderError> {
        self.registry
            .resolve(kommun, self.use_demo_data)
            .ok_or_else(|| ProviderError::UnsupportedKommun(kommun.trim().to_owned()))
    }

    /// Search for properties in the given municipality.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] if the municipality is unsupported or the provider call fails.
    pub async fn search(&self, kommun: &str, query: &str) -> Result<Vec<AddressMatch>, ProviderError> {
        let provider = self.provider_for(kommun)?;
        let matches = provider.search(query).await?;
        tracing::debug!(provider = %provider.meta().id, count = matches.len(), "search finished");
        Ok(matches)
    }

    /// Fetch the schedule snapshot for a configured household.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] if the municipality is unsupported, the provider call fails,
    /// or the selected property is gone.
    pub async fn fetch(&self, request: &FetchRequest) -> Result<ScheduleSnapshot, ProviderError> {
        let provider = self.provider_for(&request.kommun)?;
        let snapshot = provider.fetch(request).await?;
        tracing::debug!(
            provider = %snapshot.provider_id,
            match_id = %snapshot.match_id,
            events = snapshot.events.len(),
            "schedule fetched"
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MatchId;

    #[tokio::test]
    async fn unsupported_kommun_is_reported_by_name() {
        let service = BindayService::new(Arc::new(PluginRegistry::new(Vec::new())), false);

        let search = service.search(" Stockholm ", "Storgatan 1").await;
        assert!(matches!(search, Err(ProviderError::UnsupportedKommun(ref name)) if name == "Stockholm"));

        let request = FetchRequest::new("Stockholm", "Storgatan 1", MatchId::from("1"));
        let fetch = service.fetch(&request).await;
        assert!(matches!(fetch, Err(ProviderError::UnsupportedKommun(_))));
        assert!(service.kommuner().is_empty());
    }
}
