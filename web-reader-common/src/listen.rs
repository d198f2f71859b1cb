//! Listener configuration from the command line.
//!
//! ```ignore
//! use web_reader_common::listen::ListenArgs;
//! use clap::Parser;
//!
//! #[derive(Parser)]
//! struct Args {
//!     #[command(flatten)]
//!     listen: ListenArgs,
//! }
//!
//! let args = Args::parse();
//! args.listen.apply(&mut config);
//! ```

use clap::Args;

use crate::config::Config;

/// Command-line arguments for the HTTP listener.
///
/// Flags win over the environment; when neither is given the values match
/// the `Config` defaults.
#[derive(Args, Debug, Clone)]
pub struct ListenArgs {
    /// Address to bind (default: 0.0.0.0, or from HOST env var)
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on (default: 8080, or from PORT env var)
    #[arg(long, env = "PORT", default_value = "8080")]
    pub port: u16,
}

impl ListenArgs {
    /// Copy the listener settings into `config`.
    pub fn apply(self, config: &mut Config) {
        config.host = self.host;
        config.port = self.port;
    }
}

impl Default for ListenArgs {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct TestArgs {
        #[command(flatten)]
        listen: ListenArgs,
    }

    #[test]
    fn test_flags_are_parsed() {
        let args = TestArgs::try_parse_from(["web-reader", "--host", "127.0.0.1", "--port", "3001"])
            .unwrap();
        assert_eq!(args.listen.host, "127.0.0.1");
        assert_eq!(args.listen.port, 3001);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let result = TestArgs::try_parse_from(["web-reader", "--port", "not-a-port"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_apply_overrides_config() {
        let mut config = Config::default();
        ListenArgs {
            host: "127.0.0.1".to_string(),
            port: 9999,
        }
        .apply(&mut config);
        assert_eq!(config.bind_addr(), "127.0.0.1:9999");
    }

    #[test]
    fn test_default_matches_config_default() {
        let mut config = Config::default();
        let expected = config.bind_addr();
        ListenArgs::default().apply(&mut config);
        assert_eq!(config.bind_addr(), expected);
    }
}
