use std::fs;
use std::path::Path;

use log::debug;
use serde::Deserialize;
use validator::Validate;

use crate::core::GenericResult;
use crate::valuation::RateChoice;

#[derive(Deserialize, Validate, Debug)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Czech National Bank site (daily rates)
    #[serde(default = "default_daily_rates_url")]
    #[validate(url)]
    pub daily_rates_url: String,

    /// kurzy.cz site (yearly average rates)
    #[serde(default = "default_yearly_rates_url")]
    #[validate(url)]
    pub yearly_rates_url: String,

    #[serde(default)]
    pub declaration_rate: RateChoice,
}

impl Config {
    pub fn new(config_dir: &str) -> GenericResult<Config> {
        let path = Path::new(config_dir).join("config.yaml");

        let config = if path.exists() {
            Config::load(&path).map_err(|e| format!(
                "Error while reading {:?} configuration file: {}", path, e))?
        } else {
            debug!("{:?} doesn't exist. Using the default configuration.", path);
            Config::default()
        };

        Ok(config)
    }

    pub fn load(path: &Path) -> GenericResult<Config> {
        let data = fs::read(path)?;
        Config::parse(&data)
    }

    fn parse(data: &[u8]) -> GenericResult<Config> {
        let config: Config = serde_yaml::from_slice(data)?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            daily_rates_url: default_daily_rates_url(),
            yearly_rates_url: default_yearly_rates_url(),
            declaration_rate: RateChoice::default(),
        }
    }
}

fn default_daily_rates_url() -> String {
    "https://www.cnb.cz".to_owned()
}

fn default_yearly_rates_url() -> String {
    "https://www.kurzy.cz".to_owned()
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use matches::assert_matches;

    use super::*;

    #[test]
    fn parsing() {
        let config = Config::parse(indoc!("
            yearly_rates_url: http://localhost:8080
            declaration_rate: yearly-average
        ").as_bytes()).unwrap();

        assert_eq!(config.daily_rates_url, "https://www.cnb.cz");
        assert_eq!(config.yearly_rates_url, "http://localhost:8080");
        assert_eq!(config.declaration_rate, RateChoice::YearlyAverage);

        let config = Config::parse(b"{}").unwrap();
        assert_eq!(config.declaration_rate, RateChoice::Daily);
    }

    #[test]
    fn invalid_config() {
        assert_matches!(Config::parse(b"daily_rates_url: not an url"), Err(_));
        assert_matches!(Config::parse(b"declaration_rate: monthly"), Err(_));
        assert_matches!(Config::parse(b"unknown: value"), Err(_));
    }

    #[test]
    fn missing_config() {
        let directory = tempfile::tempdir().unwrap();
        let config = Config::new(directory.path().to_str().unwrap()).unwrap();
        assert_eq!(config.daily_rates_url, "https://www.cnb.cz");
    }
}
