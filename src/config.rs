use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub web_host: String,
    pub web_port: u16,
    pub max_connections: u32,
    pub session_ttl_days: i64,
    pub log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Config {
    /// Loads `.env` (if any), then reads the process environment over the defaults.
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();

        Self::load(::config::Environment::default().try_parsing(true))
    }

    pub fn load<S>(source: S) -> crate::Result<Self>
    where
        S: ::config::Source + Send + Sync + 'static,
    {
        let config = ::config::Config::builder()
            .set_default("web_host", "0.0.0.0")?
            .set_default("web_port", 3000)?
            .set_default("max_connections", 20)?
            .set_default("session_ttl_days", 7)?
            .set_default("log_format", "pretty")?
            .add_source(source)
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn web_addr(&self) -> String {
        format!("{}:{}", self.web_host, self.web_port)
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.session_ttl_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> ::config::Environment {
        let source: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ::config::Environment::default()
            .try_parsing(true)
            .source(Some(source))
    }

    #[test]
    fn test_defaults_apply() {
        let config = Config::load(env(&[("DATABASE_URL", "postgres://localhost/blog")])).unwrap();

        assert_eq!(config.database_url, "postgres://localhost/blog");
        assert_eq!(config.web_addr(), "0.0.0.0:3000");
        assert_eq!(config.max_connections, 20);
        assert_eq!(config.session_ttl(), chrono::Duration::days(7));
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_environment_overrides_defaults() {
        let config = Config::load(env(&[
            ("DATABASE_URL", "postgres://db/blog"),
            ("WEB_HOST", "127.0.0.1"),
            ("WEB_PORT", "8080"),
            ("LOG_FORMAT", "json"),
        ]))
        .unwrap();

        assert_eq!(config.web_addr(), "127.0.0.1:8080");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_missing_database_url_is_an_error() {
        assert!(Config::load(env(&[])).is_err());
    }
}
