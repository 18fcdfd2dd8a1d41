use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "quotarelay",
    about = "QuotaRelay Server - quota and backoff status for upstream AI accounts",
    version = env!("CARGO_PKG_VERSION"),
    author
)]
pub struct Cli {
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    #[arg(short, long, env = "QUOTARELAY_PORT", default_value = "8046")]
    pub port: u16,

    /// Resilience config (JSON). Defaults to ~/.quotarelay/config.json
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Account list (JSON array of {id, provider, access_token, email})
    #[arg(short, long)]
    pub accounts: Option<PathBuf>,

    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

impl Cli {
    pub fn config_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(quotarelay_core::modules::config::default_config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["quotarelay"]).expect("parse");
        assert_eq!(cli.host, "127.0.0.1");
        assert!(cli.accounts.is_none());
    }

    #[test]
    fn test_explicit_paths() {
        let cli = Cli::try_parse_from([
            "quotarelay",
            "--port",
            "9000",
            "--config",
            "/tmp/qr.json",
            "--accounts",
            "/tmp/accounts.json",
        ])
        .expect("parse");
        assert_eq!(cli.port, 9000);
        assert_eq!(cli.config_path(), Some(PathBuf::from("/tmp/qr.json")));
        assert_eq!(cli.accounts, Some(PathBuf::from("/tmp/accounts.json")));
    }

    #[test]
    fn test_rejects_bad_port() {
        assert!(Cli::try_parse_from(["quotarelay", "--port", "notaport"]).is_err());
    }
}
