use std::time::Duration;

use clap::{Parser, Subcommand};
use engine::{BusinessVertical, MoneyCents, RetryPolicy, SquareFootCalculator};
use serde::Deserialize;

use crate::error::{AppError, Result};

const DEFAULT_CONFIG_PATH: &str = "config/levelquote.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_dir: String,
    pub level: String,
    pub default_vertical: String,
    pub tax_rate_bps: u32,
    pub retry_interval_ms: u64,
    pub retry_attempts: u32,
    pub rate_low: String,
    pub rate_mid: String,
    pub rate_high: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            level: "info".to_string(),
            default_vertical: "concrete".to_string(),
            tax_rate_bps: 0,
            retry_interval_ms: 100,
            retry_attempts: 10,
            rate_low: "3.00".to_string(),
            rate_mid: "4.50".to_string(),
            rate_high: "6.00".to_string(),
        }
    }
}

impl AppConfig {
    pub fn default_vertical(&self) -> Result<BusinessVertical> {
        BusinessVertical::try_from(self.default_vertical.as_str())
            .map_err(|err| AppError::Setting("default_vertical", err.to_string()))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            interval: Duration::from_millis(self.retry_interval_ms),
            max_attempts: self.retry_attempts,
        }
    }

    pub fn calculator(&self) -> Result<SquareFootCalculator> {
        let rate = |name: &'static str, raw: &str| {
            raw.parse::<MoneyCents>()
                .map_err(|err| AppError::Setting(name, err.to_string()))
        };
        Ok(SquareFootCalculator {
            low_rate: rate("rate_low", &self.rate_low)?,
            mid_rate: rate("rate_mid", &self.rate_mid)?,
            high_rate: rate("rate_high", &self.rate_high)?,
        })
    }
}

#[derive(Debug, Parser)]
#[command(name = "levelquote", about = "Concrete and masonry invoices and estimates")]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Override the data directory.
    #[arg(long)]
    data_dir: Option<String>,
    /// Override the log level (e.g. debug).
    #[arg(long)]
    level: Option<String>,
    #[command(subcommand)]
    action: Action,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Action {
    /// Create a document.
    New {
        kind: String,
        #[arg(long)]
        vertical: Option<String>,
        #[arg(long)]
        client: Option<String>,
    },
    /// List stored documents of a kind.
    List { kind: String },
    /// Print a document with its lines and totals.
    Show { kind: String, id: String },
    /// Add a `quantity x rate` line.
    AddItem {
        kind: String,
        id: String,
        description: String,
        quantity: String,
        unit: String,
        rate: String,
    },
    /// Add a flat line, or set the custom quote in custom mode.
    AddCustom {
        kind: String,
        id: String,
        description: String,
        amount: String,
    },
    /// Price a concrete job by square footage and add it.
    Quote {
        kind: String,
        id: String,
        sqft: String,
        /// low, mid, high or an amount.
        tier: String,
        #[arg(long, default_value = "Concrete leveling")]
        description: String,
    },
    /// Remove a line by id.
    Remove { kind: String, id: String, entry: String },
    /// Switch the quote mode of the active vertical.
    Mode { kind: String, id: String, mode: String },
    /// Switch the vertical being edited.
    Vertical {
        kind: String,
        id: String,
        vertical: String,
    },
    /// Delete a stored document.
    Delete { kind: String, id: String },
}

pub fn load() -> Result<(AppConfig, Action)> {
    let args = Args::parse();

    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = ::config::Config::builder();
    builder = builder.add_source(::config::File::with_name(config_path).required(false));
    builder = builder.add_source(::config::Environment::with_prefix("LEVELQUOTE"));
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(data_dir) = args.data_dir {
        settings.data_dir = data_dir;
    }
    if let Some(level) = args.level {
        settings.level = level;
    }

    Ok((settings, args.action))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let config = AppConfig::default();
        assert_eq!(config.default_vertical().unwrap(), BusinessVertical::Concrete);
        let calculator = config.calculator().unwrap();
        assert_eq!(calculator, SquareFootCalculator::default());
        assert_eq!(config.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn bad_rate_names_the_setting() {
        let config = AppConfig {
            rate_mid: "4.505".to_string(),
            ..AppConfig::default()
        };
        assert!(matches!(
            config.calculator(),
            Err(AppError::Setting("rate_mid", _))
        ));
    }

    #[test]
    fn subcommands_parse() {
        let args = Args::try_parse_from([
            "levelquote",
            "add-item",
            "invoice",
            "abc",
            "Driveway leveling",
            "120",
            "sqft",
            "$4.50",
        ])
        .unwrap();
        assert!(matches!(args.action, Action::AddItem { ref rate, .. } if rate == "$4.50"));
    }
}
