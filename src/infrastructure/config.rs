use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub upstream: UpstreamSettings,
    pub polling: PollingSettings,
    #[serde(default)]
    pub validation: ValidationSettings,
    pub charts: ChartSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub listen_addr: String,
}

/// Base URLs of the sensor backend and the generator service.
///
/// Passed by value into the API client; nothing rewrites them at runtime.
#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamSettings {
    pub api_base_url: String,
    pub generator_base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollingSettings {
    pub live_interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ValidationSettings {
    /// Absolute tolerance for probability sums. Unset means exact equality.
    #[serde(default)]
    pub sum_tolerance: Option<f64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChartSettings {
    pub history_label_format: String,
    pub live_label_format: String,
}

impl AppConfig {
    fn validate(&self) -> anyhow::Result<()> {
        for format in [&self.charts.history_label_format, &self.charts.live_label_format] {
            if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
                anyhow::bail!("invalid chart label format '{}'", format);
            }
        }
        if self.polling.live_interval_secs == 0 {
            anyhow::bail!("polling.live_interval_secs must be positive");
        }
        if let Some(tolerance) = self.validation.sum_tolerance {
            if !(0.0..1.0).contains(&tolerance) {
                anyhow::bail!("validation.sum_tolerance must be in [0, 1), got {}", tolerance);
            }
        }
        Ok(())
    }
}

fn builder_with_defaults() -> anyhow::Result<config::ConfigBuilder<config::builder::DefaultState>> {
    Ok(config::Config::builder()
        .set_default("server.listen_addr", "0.0.0.0:8080")?
        .set_default("upstream.api_base_url", "http://localhost")?
        .set_default("upstream.generator_base_url", "http://localhost")?
        .set_default("upstream.timeout_secs", 10)?
        .set_default("polling.live_interval_secs", 30)?
        .set_default("charts.history_label_format", "%Y-%m-%d %H:%M")?
        .set_default("charts.live_label_format", "%H:%M")?)
}

fn load_config_from<S>(file: S) -> anyhow::Result<AppConfig>
where
    S: config::Source + Send + Sync + 'static,
{
    let settings = builder_with_defaults()?
        .add_source(file)
        .add_source(
            config::Environment::with_prefix("DASHBOARD")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app_config: AppConfig = settings.try_deserialize()?;
    app_config.validate()?;
    Ok(app_config)
}

/// Loads `config/dashboard.toml` (optional), then `DASHBOARD__*` overrides.
pub fn load_config() -> anyhow::Result<AppConfig> {
    load_config_from(config::File::with_name("config/dashboard").required(false))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(toml: &str) -> anyhow::Result<AppConfig> {
        load_config_from(config::File::from_str(toml, config::FileFormat::Toml))
    }

    #[test]
    fn test_defaults() {
        let config = from_toml("").unwrap();
        assert_eq!(config.server.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.upstream.api_base_url, "http://localhost");
        assert_eq!(config.polling.live_interval_secs, 30);
        assert_eq!(config.validation.sum_tolerance, None);
        assert_eq!(config.charts.live_label_format, "%H:%M");
    }

    #[test]
    fn test_file_overrides() {
        let config = from_toml(
            r#"
            [upstream]
            api_base_url = "http://backend:8000"
            generator_base_url = "http://generator:8001"

            [validation]
            sum_tolerance = 1e-9
            "#,
        )
        .unwrap();
        assert_eq!(config.upstream.api_base_url, "http://backend:8000");
        assert_eq!(config.upstream.generator_base_url, "http://generator:8001");
        assert_eq!(config.upstream.timeout_secs, 10);
        assert_eq!(config.validation.sum_tolerance, Some(1e-9));
    }

    #[test]
    fn test_rejects_bad_label_format() {
        let err = from_toml(
            r#"
            [charts]
            live_label_format = "%Q%"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("label format"));
    }

    #[test]
    fn test_rejects_zero_interval() {
        assert!(from_toml("[polling]\nlive_interval_secs = 0").is_err());
    }
}
