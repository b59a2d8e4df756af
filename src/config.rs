use std::env;
use std::str::FromStr;

use clap::Parser;
use tracing::info;

use crate::errors::ConfigError;

/// Size of the worker pool. Never more than this many requests are in flight.
pub const NUM_WORKERS: usize = 8;

/// Positional command line arguments.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Fire a burst of JSON POST requests at a URL and print the elapsed seconds",
    long_about = None
)]
pub struct Args {
    /// Number of POST requests to send
    pub num_requests: usize,

    /// URL to send the requests to
    pub url: String,
}

/// Output format of the diagnostic log on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::InvalidLogFormat(s.to_string())),
        }
    }
}

/// Run parameters, fixed for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct Config {
    pub num_requests: usize,
    pub target_url: String,
    pub num_workers: usize,
    pub log_format: LogFormat,
}

impl Config {
    /// Builds a config with the default pool size and text logging.
    pub fn new(num_requests: usize, target_url: impl Into<String>) -> Self {
        Config {
            num_requests,
            target_url: target_url.into(),
            num_workers: NUM_WORKERS,
            log_format: LogFormat::default(),
        }
    }

    /// Combines parsed CLI arguments with the `LOG_FORMAT` environment variable.
    pub fn from_env(args: Args) -> Result<Self, ConfigError> {
        Self::from_parts(args, env::var("LOG_FORMAT").ok().as_deref())
    }

    fn from_parts(args: Args, log_format: Option<&str>) -> Result<Self, ConfigError> {
        let log_format = match log_format {
            Some(raw) if !raw.trim().is_empty() => raw.parse()?,
            _ => LogFormat::default(),
        };

        Ok(Config {
            log_format,
            ..Config::new(args.num_requests, args.url)
        })
    }

    /// Logs the configuration summary. Goes to stderr with the rest of the log.
    pub fn log_summary(&self) {
        info!(
            target_url = %self.target_url,
            num_requests = self.num_requests,
            num_workers = self.num_workers,
            log_format = ?self.log_format,
            "Starting burst"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(argv)
    }

    mod args {
        use super::*;

        #[test]
        fn parses_count_then_url() {
            let args = parse(&["post_burst", "100", "http://localhost:12321/db"]).unwrap();
            assert_eq!(args.num_requests, 100);
            assert_eq!(args.url, "http://localhost:12321/db");
        }

        #[test]
        fn zero_requests_is_accepted() {
            let args = parse(&["post_burst", "0", "http://localhost"]).unwrap();
            assert_eq!(args.num_requests, 0);
        }

        #[test]
        fn non_numeric_count_is_rejected() {
            assert!(parse(&["post_burst", "many", "http://localhost"]).is_err());
        }

        #[test]
        fn negative_count_is_rejected() {
            assert!(parse(&["post_burst", "-5", "http://localhost"]).is_err());
        }

        #[test]
        fn missing_url_is_rejected() {
            let err = parse(&["post_burst", "10"]).unwrap_err();
            assert_eq!(
                err.kind(),
                clap::error::ErrorKind::MissingRequiredArgument
            );
        }

        #[test]
        fn malformed_url_is_not_a_startup_error() {
            let args = parse(&["post_burst", "3", "not a url"]).unwrap();
            assert_eq!(args.url, "not a url");
        }
    }

    mod log_format {
        use super::*;

        #[test]
        fn parses_known_formats() {
            assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
            assert_eq!(" JSON ".parse::<LogFormat>().unwrap(), LogFormat::Json);
        }

        #[test]
        fn rejects_unknown_format() {
            assert_eq!(
                "yaml".parse::<LogFormat>(),
                Err(ConfigError::InvalidLogFormat("yaml".to_string()))
            );
        }

        #[test]
        fn unset_or_empty_defaults_to_text() {
            let args = parse(&["post_burst", "1", "http://localhost"]).unwrap();
            let config = Config::from_parts(args, None).unwrap();
            assert_eq!(config.log_format, LogFormat::Text);

            let args = parse(&["post_burst", "1", "http://localhost"]).unwrap();
            let config = Config::from_parts(args, Some("  ")).unwrap();
            assert_eq!(config.log_format, LogFormat::Text);
        }
    }

    #[test]
    fn config_uses_fixed_pool_size() {
        let args = parse(&["post_burst", "42", "http://localhost/x"]).unwrap();
        let config = Config::from_parts(args, Some("json")).unwrap();
        assert_eq!(config.num_requests, 42);
        assert_eq!(config.target_url, "http://localhost/x");
        assert_eq!(config.num_workers, NUM_WORKERS);
        assert_eq!(config.log_format, LogFormat::Json);
    }
}
