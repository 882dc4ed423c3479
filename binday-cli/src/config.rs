use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use binday_core::display::SummaryOptions;
use binday_core::model::MatchId;
use binday_core::ports::FetchRequest;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

const SCAN_INTERVAL_RANGE: RangeInclusive<u32> = 1..=168;
const LIST_LIMIT_RANGE: RangeInclusive<usize> = 1..=50;

/// Household selected during `binday init`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Household {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lan: Option<String>,
    pub kommun: String,
    pub address_query: String,
    pub match_id: String,
    pub match_label: String,
}

impl Household {
    pub(crate) fn fetch_request(&self) -> FetchRequest {
        FetchRequest::new(
            self.kommun.as_str(),
            self.address_query.as_str(),
            MatchId::from(self.match_id.as_str()),
        )
    }
}

/// Tunables, all optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Options {
    pub scan_interval_hours: u32,
    pub upcoming_limit: usize,
    pub create_per_type_sensors: bool,
    pub per_type_sensor_cap: usize,
    pub use_demo_data: bool,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            scan_interval_hours: 12,
            upcoming_limit: 10,
            create_per_type_sensors: false,
            per_type_sensor_cap: 10,
            use_demo_data: false,
            request_timeout_secs: 30,
            user_agent: format!("binday/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Options {
    pub(crate) fn scan_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.scan_interval_hours) * 3_600)
    }

    pub(crate) fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub(crate) fn summary_options(&self) -> SummaryOptions {
        SummaryOptions {
            upcoming_limit: self.upcoming_limit,
            per_type_cap: self
                .create_per_type_sensors
                .then_some(self.per_type_sensor_cap),
        }
    }

    fn validate(&self) -> Result<()> {
        if !SCAN_INTERVAL_RANGE.contains(&self.scan_interval_hours) {
            bail!(
                "scan_interval_hours must be between {} and {} (got {})",
                SCAN_INTERVAL_RANGE.start(),
                SCAN_INTERVAL_RANGE.end(),
                self.scan_interval_hours
            );
        }
        if !LIST_LIMIT_RANGE.contains(&self.upcoming_limit) {
            bail!(
                "upcoming_limit must be between {} and {} (got {})",
                LIST_LIMIT_RANGE.start(),
                LIST_LIMIT_RANGE.end(),
                self.upcoming_limit
            );
        }
        if !LIST_LIMIT_RANGE.contains(&self.per_type_sensor_cap) {
            bail!(
                "per_type_sensor_cap must be between {} and {} (got {})",
                LIST_LIMIT_RANGE.start(),
                LIST_LIMIT_RANGE.end(),
                self.per_type_sensor_cap
            );
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be positive");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub household: Option<Household>,
    #[serde(default)]
    pub options: Options,
}

impl Config {
    /// `config.toml` in the platform's configuration directory.
    pub(crate) fn default_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("se", "binday", "binday")
            .context("could not determine a configuration directory")?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Load and validate the file at `path`; a missing file yields the defaults.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
        config
            .options
            .validate()
            .with_context(|| format!("invalid config file '{}'", path.display()))?;
        Ok(config)
    }

    pub(crate) fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create '{}'", parent.display()))?;
        }
        let contents = toml::to_string_pretty(self).context("failed to serialize config")?;
        fs::write(path, contents)
            .with_context(|| format!("failed to write config file '{}'", path.display()))?;
        Ok(())
    }

    pub(crate) fn household(&self) -> Result<&Household> {
        self.household
            .as_ref()
            .context("no household configured; run `binday init` first")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn household() -> Household {
        Household {
            lan: Some("Skåne län".to_owned()),
            kommun: "Bjuv".to_owned(),
            address_query: "Storgatan 1".to_owned(),
            match_id: "3405617".to_owned(),
            match_label: "Storgatan 1, Bjuv".to_owned(),
        }
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config::load(&dir.path().join("absent.toml")).expect("defaults");
        assert_eq!(config, Config::default());
        assert!(config.household().is_err());
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            household: Some(household()),
            options: Options {
                use_demo_data: true,
                ..Options::default()
            },
        };

        config.save(&path).expect("save");
        let loaded = Config::load(&path).expect("load");

        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_options_fall_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[options]\nupcoming_limit = 5\n").expect("write");

        let config = Config::load(&path).expect("load");

        assert_eq!(config.options.upcoming_limit, 5);
        assert_eq!(config.options.scan_interval_hours, 12);
        assert!(config.household.is_none());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[options]\nscan_interval_hours = 0\n").expect("write");

        let err = Config::load(&path).expect_err("invalid interval");
        assert!(format!("{err:#}").contains("scan_interval_hours"));

        fs::write(&path, "[options]\nper_type_sensor_cap = 51\n").expect("write");
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn per_type_dates_follow_the_toggle() {
        let mut options = Options::default();
        assert_eq!(options.summary_options().per_type_cap, None);

        options.create_per_type_sensors = true;
        options.per_type_sensor_cap = 3;
        assert_eq!(options.summary_options().per_type_cap, Some(3));
        assert_eq!(options.scan_interval(), Duration::from_secs(12 * 3_600));
    }

    #[test]
    fn household_builds_trimmed_request() {
        let mut household = household();
        household.match_id = " 3405617 ".to_owned();
        let request = household.fetch_request();
        assert_eq!(request.match_id, MatchId("3405617".to_owned()));
        assert_eq!(request.kommun, "Bjuv");
    }
}
