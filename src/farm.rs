// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A YAML-configured farm of bots, meant to be driven by cron.
//!
//! A [`Farm`] loads a configuration file describing one or more bot
//! accounts and the operations each should perform, then runs every
//! operation whose periodicity has elapsed. Last-run timestamps are kept in
//! a YAML cron-log file between invocations, so the farm itself can be
//! scheduled much more often than its operations.
//!
//! ```yaml
//! global:
//!   debug: true
//! bots:
//!   myfirstbot:
//!     password: mypassw0rd
//!     operations:
//!       search_and_retweet:
//!         arguments:
//!           terms: "my search terms"
//!           options:
//!             template: "RT @{user}: {text}"
//!         periodicity: 3600
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::bot::{SearchOptions, TwitterBot};
use crate::error::{Error, Result};

/// The smallest allowed operation periodicity, in seconds.
pub const MIN_PERIODICITY: i64 = 60;

const CRONLOG_DEFAULT_FILENAME: &str = ".tweetbot.cronlogs.yml";

/// Farm-wide configuration defaults.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct GlobalConfig {
    /// Enables verbose diagnostics. Event filtering itself is the tracing
    /// subscriber's business; this flag is kept for configuration
    /// compatibility and surfaced at startup.
    #[serde(default)]
    pub debug: Option<bool>,
    /// Whether a failing operation aborts the whole farm run (the default)
    /// or is logged and skipped.
    #[serde(default)]
    pub stoponfail: Option<bool>,
}

/// Configuration of a single bot account.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct BotConfig {
    /// The account password.
    pub password: String,
    /// Per-bot override of the global debug flag.
    #[serde(default)]
    pub debug: Option<bool>,
    /// The operations to run, keyed by operation name.
    #[serde(default)]
    pub operations: BTreeMap<String, OperationConfig>,
}

/// Configuration of one bot operation.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct OperationConfig {
    /// Seconds that must elapse between two runs of this operation.
    /// Clamped to [`MIN_PERIODICITY`]; absent means "every run".
    #[serde(default)]
    pub periodicity: Option<i64>,
    /// Operation arguments, deserialized per operation at dispatch time.
    #[serde(default)]
    pub arguments: serde_yaml::Value,
}

/// The whole farm configuration file.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct FarmConfig {
    /// Farm-wide defaults.
    #[serde(default)]
    pub global: GlobalConfig,
    /// The configured bots, keyed by account name.
    pub bots: BTreeMap<String, BotConfig>,
}

/// Last-run timestamps: bot name → operation name → unix timestamp.
type CronLogs = BTreeMap<String, BTreeMap<String, i64>>;

/// Arguments of the `search_and_retweet` operation.
#[derive(Debug, serde::Deserialize)]
struct SearchArgs {
    terms: String,
    #[serde(default)]
    options: SearchOptions,
}

/// A configured farm of bots.
pub struct Farm {
    config: FarmConfig,
    cron_logs: CronLogs,
    cron_logs_path: PathBuf,
    force_update: bool,
}

impl Farm {
    /// Creates a farm from an already-parsed configuration.
    pub fn new(config: FarmConfig) -> Result<Self> {
        if config.bots.is_empty() {
            return Err(Error::Config(
                "no valid bots configuration found".to_string(),
            ));
        }
        if config.global.debug.unwrap_or(false) {
            tracing::debug!("farm debug mode requested by configuration");
        }
        Ok(Farm {
            config,
            cron_logs: CronLogs::new(),
            cron_logs_path: std::env::temp_dir().join(CRONLOG_DEFAULT_FILENAME),
            force_update: false,
        })
    }

    /// Creates a farm from a YAML configuration file.
    pub fn from_path(config_path: &Path) -> Result<Self> {
        tracing::debug!(path = %config_path.display(), "loading farm configuration");
        let text = std::fs::read_to_string(config_path)?;
        let config: FarmConfig = serde_yaml::from_str(&text)?;
        Self::new(config)
    }

    /// Overrides the cron-log file location.
    pub fn with_cron_logs_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cron_logs_path = path.into();
        self
    }

    /// Runs every operation regardless of periodicity.
    pub fn with_force_update(mut self, force_update: bool) -> Self {
        if force_update {
            tracing::debug!("forcing updates");
        }
        self.force_update = force_update;
        self
    }

    /// The parsed farm configuration.
    pub fn config(&self) -> &FarmConfig {
        &self.config
    }

    fn stop_on_fail(&self) -> bool {
        self.config.global.stoponfail.unwrap_or(true)
    }

    /// Runs all configured bots. When an operation fails under
    /// `stoponfail`, the timestamps gathered so far are still written
    /// before the error is surfaced.
    pub async fn run(&mut self) -> Result<()> {
        tracing::debug!("running the farm");
        self.load_cron_logs()?;

        let bots = self.config.bots.clone();
        for (name, bot_config) in &bots {
            tracing::debug!(bot = %name, "running bot");
            if let Err(err) = self.run_bot_config(name, bot_config).await {
                tracing::debug!("interrupted run, writing processed operations to cron logs");
                self.write_cron_logs()?;
                return Err(err);
            }
        }
        Ok(())
    }

    /// Runs a single configured bot by name.
    pub async fn run_bot(&mut self, name: &str) -> Result<()> {
        self.load_cron_logs()?;
        let bot_config = self
            .config
            .bots
            .get(name)
            .cloned()
            .ok_or_else(|| Error::Config(format!("bot \"{}\" is not configured", name)))?;
        self.run_bot_config(name, &bot_config).await
    }

    async fn run_bot_config(&mut self, name: &str, config: &BotConfig) -> Result<()> {
        if config.operations.is_empty() {
            return Err(Error::Config(format!(
                "no operations configured for bot \"{}\"",
                name
            )));
        }

        let bot = TwitterBot::new(name, &config.password);
        let now = chrono::Utc::now().timestamp();

        for (op_name, op) in &config.operations {
            if !self.force_update && !self.is_operation_due(name, op_name, op.periodicity, now) {
                tracing::debug!(bot = %name, operation = %op_name, "operation not expired, skipping");
                continue;
            }

            tracing::debug!(bot = %name, operation = %op_name, "operation expired, processing");
            if let Err(err) = dispatch(&bot, op_name, op).await {
                if self.stop_on_fail() {
                    return Err(err);
                }
                tracing::warn!(bot = %name, operation = %op_name, error = %err, "operation failed");
            }
            self.update_cron_log(name, op_name);
        }

        self.write_cron_logs()
    }

    /// Whether an operation's periodicity has elapsed. An operation never
    /// seen before, or one with no configured periodicity, is always due.
    fn is_operation_due(
        &self,
        bot: &str,
        operation: &str,
        periodicity: Option<i64>,
        now: i64,
    ) -> bool {
        let periodicity = match periodicity {
            Some(value) => value.max(MIN_PERIODICITY),
            None => return true,
        };
        match self
            .cron_logs
            .get(bot)
            .and_then(|operations| operations.get(operation))
        {
            Some(last_run) => last_run + periodicity < now,
            None => true,
        }
    }

    fn update_cron_log(&mut self, bot: &str, operation: &str) {
        tracing::debug!(bot = %bot, operation = %operation, "updating cron log");
        self.cron_logs
            .entry(bot.to_string())
            .or_default()
            .insert(operation.to_string(), chrono::Utc::now().timestamp());
    }

    /// Loads the cron logs, if the file exists. A missing, empty or
    /// unreadable file simply means no operation has run yet.
    fn load_cron_logs(&mut self) -> Result<()> {
        tracing::debug!(path = %self.cron_logs_path.display(), "loading cron logs");
        if !self.cron_logs_path.exists() {
            self.cron_logs = CronLogs::new();
            return Ok(());
        }
        let text = std::fs::read_to_string(&self.cron_logs_path)?;
        self.cron_logs = serde_yaml::from_str(&text).unwrap_or_default();
        Ok(())
    }

    fn write_cron_logs(&self) -> Result<()> {
        tracing::debug!(path = %self.cron_logs_path.display(), "writing cron logs");
        let text = serde_yaml::to_string(&self.cron_logs)?;
        std::fs::write(&self.cron_logs_path, text)?;
        Ok(())
    }
}

/// Runs one named, config-driven operation on a bot.
async fn dispatch(bot: &TwitterBot, op_name: &str, op: &OperationConfig) -> Result<()> {
    match op_name {
        "search_and_retweet" => {
            let args: SearchArgs = serde_yaml::from_value(op.arguments.clone())?;
            bot.search_and_retweet(&args.terms, &args.options).await?;
            Ok(())
        }
        "follow_followers" => {
            bot.follow_followers().await?;
            Ok(())
        }
        other => Err(Error::Config(format!(
            "operation \"{}\" is not supported",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CONFIG: &str = r#"
global:
  debug: true
  stoponfail: false
bots:
  myfirstbot:
    password: mypassw0rd
    operations:
      search_and_retweet:
        arguments:
          terms: "my search terms"
          options:
            template: "RT @{user}: {text}"
            follow: true
        periodicity: 3600
      follow_followers:
        periodicity: 60
"#;

    fn sample_farm() -> Farm {
        let config: FarmConfig = serde_yaml::from_str(SAMPLE_CONFIG).unwrap();
        Farm::new(config).unwrap()
    }

    #[test]
    fn sample_config_parses() {
        let farm = sample_farm();
        assert_eq!(farm.config().global.debug, Some(true));
        assert!(!farm.stop_on_fail());

        let bot = &farm.config().bots["myfirstbot"];
        assert_eq!(bot.password, "mypassw0rd");
        assert_eq!(bot.operations.len(), 2);
        assert_eq!(
            bot.operations["search_and_retweet"].periodicity,
            Some(3600)
        );
    }

    #[test]
    fn search_arguments_deserialize() {
        let farm = sample_farm();
        let op = &farm.config().bots["myfirstbot"].operations["search_and_retweet"];
        let args: SearchArgs = serde_yaml::from_value(op.arguments.clone()).unwrap();
        assert_eq!(args.terms, "my search terms");
        assert_eq!(args.options.template, "RT @{user}: {text}");
        assert!(args.options.follow);
    }

    #[test]
    fn missing_bots_section_is_rejected() {
        let err = serde_yaml::from_str::<FarmConfig>("global:\n  debug: true\n");
        assert!(err.is_err());

        let empty: FarmConfig = serde_yaml::from_str("bots: {}\n").unwrap();
        assert!(matches!(Farm::new(empty), Err(Error::Config(_))));
    }

    #[test]
    fn unseen_operations_are_due() {
        let farm = sample_farm();
        assert!(farm.is_operation_due("myfirstbot", "search_and_retweet", Some(3600), 1_000_000));
    }

    #[test]
    fn fresh_operations_are_not_due() {
        let mut farm = sample_farm();
        let now = 1_000_000;
        farm.cron_logs
            .entry("myfirstbot".to_string())
            .or_default()
            .insert("search_and_retweet".to_string(), now - 100);
        assert!(!farm.is_operation_due("myfirstbot", "search_and_retweet", Some(3600), now));
        assert!(farm.is_operation_due("myfirstbot", "search_and_retweet", Some(3600), now + 4000));
    }

    #[test]
    fn absent_periodicity_runs_every_time() {
        let mut farm = sample_farm();
        let now = 1_000_000;
        // Ran ten seconds ago; with no configured periodicity the minimum
        // does not apply and the operation is due on every invocation.
        farm.cron_logs
            .entry("myfirstbot".to_string())
            .or_default()
            .insert("follow_followers".to_string(), now - 10);
        assert!(farm.is_operation_due("myfirstbot", "follow_followers", None, now));
    }

    #[test]
    fn periodicity_is_clamped_to_minimum() {
        let mut farm = sample_farm();
        let now = 1_000_000;
        farm.cron_logs
            .entry("myfirstbot".to_string())
            .or_default()
            .insert("follow_followers".to_string(), now - 30);
        // 1 second requested, but the minimum of 60 applies.
        assert!(!farm.is_operation_due("myfirstbot", "follow_followers", Some(1), now));
        assert!(farm.is_operation_due("myfirstbot", "follow_followers", Some(1), now + 31));
    }

    #[test]
    fn cron_logs_round_trip_through_file() {
        let path = std::env::temp_dir().join(format!(
            ".tweetbot-test-cronlogs-{}.yml",
            std::process::id()
        ));
        let mut farm = sample_farm().with_cron_logs_file(&path);
        farm.update_cron_log("myfirstbot", "follow_followers");
        farm.write_cron_logs().unwrap();

        let mut reloaded = sample_farm().with_cron_logs_file(&path);
        reloaded.load_cron_logs().unwrap();
        assert!(reloaded
            .cron_logs
            .get("myfirstbot")
            .and_then(|ops| ops.get("follow_followers"))
            .is_some());

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_cron_log_file_means_nothing_ran() {
        let mut farm = sample_farm().with_cron_logs_file("/nonexistent/dir/cronlogs.yml");
        farm.load_cron_logs().unwrap();
        assert!(farm.cron_logs.is_empty());
    }

    #[tokio::test]
    async fn unknown_operations_are_rejected() {
        let bot = TwitterBot::new("mybot", "pass");
        let op = OperationConfig::default();
        match dispatch(&bot, "mass_mention_everyone", &op).await {
            Err(Error::Config(message)) => assert!(message.contains("mass_mention_everyone")),
            other => panic!("expected Config error, got {:?}", other),
        }
    }
}
