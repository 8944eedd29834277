use log::LevelFilter;
use zse_api::client::DEFAULT_BASE_URL;

pub const API_URL_ENV: &str = "ZSE_API_URL";
pub const LOG_LEVEL_ENV: &str = "ZSE_LOG_LEVEL";

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub api_url: String,
    pub full_screen: bool,
    pub log_level: Option<LevelFilter>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self { api_url: DEFAULT_BASE_URL.to_string(), full_screen: false, log_level: None }
    }
}

impl AppSettings {
    /// Command line wins over the environment, which wins over defaults.
    pub fn load(cli_api_url: Option<String>) -> Self {
        Self::from_sources(
            cli_api_url,
            std::env::var(API_URL_ENV).ok(),
            std::env::var(LOG_LEVEL_ENV).ok(),
        )
    }

    fn from_sources(
        cli_api_url: Option<String>,
        env_api_url: Option<String>,
        env_log_level: Option<String>,
    ) -> Self {
        let api_url = cli_api_url
            .or(env_api_url)
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let log_level = env_log_level.and_then(|level| level.trim().parse::<LevelFilter>().ok());
        Self { api_url, full_screen: false, log_level }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_beats_env_beats_default() {
        let s = AppSettings::from_sources(
            Some("http://cli:1".into()),
            Some("http://env:2".into()),
            None,
        );
        assert_eq!(s.api_url, "http://cli:1");

        let s = AppSettings::from_sources(None, Some("http://env:2".into()), None);
        assert_eq!(s.api_url, "http://env:2");

        let s = AppSettings::from_sources(None, None, None);
        assert_eq!(s.api_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn blank_url_falls_back_to_default() {
        let s = AppSettings::from_sources(None, Some("   ".into()), None);
        assert_eq!(s.api_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn log_level_parses_or_is_ignored() {
        let s = AppSettings::from_sources(None, None, Some("debug".into()));
        assert_eq!(s.log_level, Some(LevelFilter::Debug));
        let s = AppSettings::from_sources(None, None, Some("chatty".into()));
        assert_eq!(s.log_level, None);
    }
}
