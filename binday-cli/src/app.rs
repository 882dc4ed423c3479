use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use binday_core::{
    display::NextCollectionSummary,
    model::{AddressMatch, MatchId, ScheduleSnapshot},
    plugin::PluginRegistry,
    ports::{FetchRequest, ProviderError},
    service::BindayService,
};
use binday_provider_nsr as nsr;
use chrono::Local;
use reqwest::Client;
use tokio::time::{self, MissedTickBehavior};

use crate::cli::{Command, join_query};
use crate::config::{Config, Household};
use crate::report;

pub(crate) struct App {
    service: BindayService,
    config: Config,
    config_path: PathBuf,
}

impl App {
    pub(crate) fn new(config_path: PathBuf, force_demo: bool) -> Result<Self> {
        let config = Config::load(&config_path)?;

        let client = Client::builder()
            .user_agent(config.options.user_agent.as_str())
            .timeout(config.options.request_timeout())
            .build()
            .context("failed to build HTTP client")?;

        let registry = Arc::new(PluginRegistry::new(vec![nsr::plugin(client)]));
        let use_demo_data = force_demo || config.options.use_demo_data;
        let service = BindayService::new(registry, use_demo_data);

        Ok(Self {
            service,
            config,
            config_path,
        })
    }

    pub(crate) async fn run(mut self, command: Command) -> Result<()> {
        match command {
            Command::Kommuner => write_out(&self.service.kommuner().join("\n")),
            Command::Search { kommun, query } => {
                let matches = self.service.search(&kommun, &join_query(&query)).await?;
                write_out(&report::render_matches(&matches))
            }
            Command::Init {
                kommun,
                lan,
                match_id,
                query,
            } => self.init(kommun, lan, match_id, join_query(&query)).await,
            Command::Fetch { json } => {
                let snapshot = self
                    .service
                    .fetch(&self.request()?)
                    .await
                    .map_err(fetch_error)?;
                if json {
                    write_out(&serde_json::to_string_pretty(&snapshot)?)
                } else {
                    write_out(&self.summary_text(&snapshot))
                }
            }
            Command::Watch => self.watch().await,
        }
    }

    async fn init(
        &mut self,
        kommun: String,
        lan: Option<String>,
        match_id: Option<String>,
        address_query: String,
    ) -> Result<()> {
        let matches = self.service.search(&kommun, &address_query).await?;
        let wanted = match_id.as_deref().map(MatchId::from);
        let selected = select_match(matches, wanted.as_ref())?;

        let household = Household {
            lan,
            kommun: kommun.trim().to_owned(),
            address_query,
            match_id: selected.id.0,
            match_label: selected.label,
        };
        tracing::info!(match_id = %household.match_id, "storing selected property");

        let label = household.match_label.clone();
        self.config.household = Some(household);
        self.config.save(&self.config_path)?;

        write_out(&format!("Saved {label} to {}", self.config_path.display()))
    }

    async fn watch(&self) -> Result<()> {
        let request = self.request()?;
        let timeout = self.config.options.request_timeout();

        let mut ticker = time::interval(self.config.options.scan_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("stopping schedule refresh");
                    return Ok(());
                }
            }

            match time::timeout(timeout, self.service.fetch(&request)).await {
                Ok(Ok(snapshot)) => write_out(&self.summary_text(&snapshot))?,
                Ok(Err(err)) if err.is_retryable() => {
                    tracing::warn!(%err, "schedule refresh failed, retrying on next interval");
                }
                Ok(Err(err)) => return Err(fetch_error(err)),
                Err(_elapsed) => {
                    tracing::warn!(?timeout, "schedule refresh timed out, retrying on next interval");
                }
            }
        }
    }

    fn request(&self) -> Result<FetchRequest> {
        Ok(self.config.household()?.fetch_request())
    }

    fn summary_text(&self, snapshot: &ScheduleSnapshot) -> String {
        let today = Local::now().date_naive();
        let summary =
            NextCollectionSummary::from_snapshot(snapshot, today, self.config.options.summary_options());
        report::render_summary(&summary, today)
    }
}

/// Pick the property to store from a search result.
///
/// A single match is taken as is; several matches need an explicit id.
pub(crate) fn select_match(
    matches: Vec<AddressMatch>,
    wanted: Option<&MatchId>,
) -> Result<AddressMatch> {
    if matches.is_empty() {
        bail!("no properties matched the search");
    }

    let candidates = report::render_matches(&matches);
    match wanted {
        Some(wanted) => matches
            .into_iter()
            .find(|found| &found.id == wanted)
            .with_context(|| format!("property {wanted} is not among the matches:\n{candidates}")),
        None if matches.len() == 1 => matches
            .into_iter()
            .next()
            .context("no properties matched the search"),
        None => bail!("several properties match, pick one with --match-id:\n{candidates}"),
    }
}

fn fetch_error(err: ProviderError) -> anyhow::Error {
    if err.is_stale_selection() {
        tracing::warn!("stored property is no longer known to the provider");
        anyhow::Error::new(err).context("the configured property has to be selected again with `binday init`")
    } else {
        anyhow::Error::new(err)
    }
}

fn write_out(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{text}")?;
    Ok(())
}
