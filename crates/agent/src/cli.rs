use clap::{Parser, Subcommand};
use infrastructure::config::{LogFormat, LogLevel};
use infrastructure::constants::DEFAULT_CONFIG_PATH;

#[derive(Parser, Debug)]
#[command(
    name = "fabricguard-agent",
    about = "Alert-driven DDoS mitigation for OpenFlow fabrics",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, env = "FABRICGUARD_CONFIG")]
    pub config: String,

    /// Log level override (takes precedence over config file)
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Log format: json (default, production) or text (development)
    #[arg(long)]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the mitigation agent (default)
    Run,

    /// Display version and build information
    Version,

    /// Validate the configuration file and print it with credentials masked
    CheckConfig,
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_default_config_path() {
        let cli = Cli::try_parse_from(["fabricguard-agent"]).unwrap();
        assert_eq!(cli.config, DEFAULT_CONFIG_PATH);
        assert!(cli.log_level.is_none());
        assert!(cli.log_format.is_none());
        assert!(cli.command.is_none());
    }

    #[test]
    fn cli_custom_config_path() {
        let cli =
            Cli::try_parse_from(["fabricguard-agent", "--config", "/tmp/test.yaml"]).unwrap();
        assert_eq!(cli.config, "/tmp/test.yaml");
    }

    #[test]
    fn cli_log_overrides() {
        let cli = Cli::try_parse_from([
            "fabricguard-agent",
            "--log-level",
            "debug",
            "--log-format",
            "text",
        ])
        .unwrap();
        assert_eq!(cli.log_level, Some(LogLevel::Debug));
        assert_eq!(cli.log_format, Some(LogFormat::Text));
    }

    #[test]
    fn cli_invalid_log_level_rejected() {
        assert!(Cli::try_parse_from(["fabricguard-agent", "--log-level", "loud"]).is_err());
    }

    #[test]
    fn cli_subcommands() {
        let cli = Cli::try_parse_from(["fabricguard-agent", "version"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Version)));

        let cli = Cli::try_parse_from(["fabricguard-agent", "run"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Run)));

        let cli = Cli::try_parse_from(["fabricguard-agent", "-c", "/x.yaml", "check-config"])
            .unwrap();
        assert!(matches!(cli.command, Some(Command::CheckConfig)));
        assert_eq!(cli.config, "/x.yaml");
    }
}
