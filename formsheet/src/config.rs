use intake::config::IntakeConfig;
use serde::Deserialize;
use std::fs::File;

#[derive(Deserialize, Debug, PartialEq)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
    #[serde(default = "default_metrics_prefix")]
    pub prefix: String,
}

fn default_metrics_prefix() -> String {
    "formsheet".into()
}

fn default_log_level() -> String {
    "info".into()
}

#[derive(Deserialize, Debug, PartialEq)]
pub struct LoggingConfig {
    pub sentry_dsn: Option<String>,
    /// Default filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            sentry_dsn: None,
            level: default_log_level(),
        }
    }
}

#[derive(Deserialize, Debug, PartialEq)]
pub struct CommonConfig {
    pub metrics: Option<MetricsConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Deserialize, Debug)]
pub struct Config {
    #[serde(flatten)]
    pub common: CommonConfig,
    pub intake: IntakeConfig,
}

impl Config {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data: Config = serde_yaml::from_reader(file)?;
        data.intake.validate()?;

        Ok(data)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    ValidationError(#[from] intake::config::ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp_file(s: &str) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        write!(tmp, "{}", s).expect("write yaml");

        tmp
    }

    #[test]
    fn full_config() {
        let yaml = r#"
            metrics:
                statsd_host: 127.0.0.1
                statsd_port: 8125
            logging:
                sentry_dsn: https://public@sentry.example.com/1
                level: debug
            intake:
                listener:
                    host: 0.0.0.0
                    port: 8080
                spreadsheet_id: 1AbCdEf
                template_sheet: Template
                field_map:
                    First Name: E5
                    Last Name: L5
                store:
                    type: google_sheets
                    access_token_env: GOOGLE_ACCESS_TOKEN
            "#;
        let tmp = write_tmp_file(yaml);
        let config = Config::from_file(tmp.path()).expect("load config");

        let metrics = config.common.metrics.expect("metrics config");
        assert_eq!(metrics.statsd_port, 8125);
        assert_eq!(metrics.prefix, "formsheet");
        assert_eq!(config.common.logging.level, "debug");
        assert_eq!(config.intake.template_sheet, "Template");
        assert_eq!(config.intake.field_map.len(), 2);
    }

    #[test]
    fn minimal_config() {
        let yaml = r#"
            intake:
                spreadsheet_id: local
                template_sheet: Template
                field_map: {Email: E11}
                store: {type: memory, sheets: [Template]}
            "#;
        let tmp = write_tmp_file(yaml);
        let config = Config::from_file(tmp.path()).expect("load config");
        assert_eq!(config.common.metrics, None);
        assert_eq!(config.common.logging, LoggingConfig::default());
    }

    #[test]
    fn example_config() {
        let path =
            std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../example_config.yaml");
        let config = Config::from_file(&path).expect("load example config");
        assert_eq!(config.intake.field_map.len(), 10);
        assert_eq!(config.intake.field_map["Email"], "E11");
    }

    #[test]
    fn invalid_config() {
        let yaml = r#"
            intake:
                spreadsheet_id: local
                template_sheet: Template
                field_map: {Email: "11E"}
                store: {type: memory}
            "#;
        let tmp = write_tmp_file(yaml);
        assert!(matches!(
            Config::from_file(tmp.path()),
            Err(ConfigError::ValidationError(_))
        ));

        assert!(matches!(
            Config::from_file(std::path::Path::new("/nonexistent/formsheet.yaml")),
            Err(ConfigError::LoadError(_))
        ));
    }
}
