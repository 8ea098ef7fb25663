use std::path::PathBuf;

use clap::Parser;

use crate::net::Mode;

/// Line-oriented TCP relay between the console and a remote peer.
///
/// Type `exit` (or receive it from the peer) to hang up.
#[derive(Debug, Parser)]
#[command(name = "linecat", version, about)]
#[command(override_usage = "linecat <HOST> <PORT>\n       linecat -l -p <PORT>")]
pub struct Cli {
    /// Listen for a single incoming connection instead of connecting
    #[arg(short = 'l', long = "listen", requires = "listen_port")]
    pub listen: bool,

    /// Port to listen on (with -l)
    #[arg(short = 'p', long = "port", value_name = "PORT", requires = "listen")]
    pub listen_port: Option<u16>,

    /// Path to config file (default: <config dir>/linecat/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Remote host (client mode)
    #[arg(value_name = "HOST", conflicts_with = "listen", requires = "port")]
    pub host: Option<String>,

    /// Remote port (client mode)
    #[arg(value_name = "PORT")]
    pub port: Option<u16>,
}

impl Cli {
    /// Resolve the parsed flags into a connection mode.
    ///
    /// Returns `None` when neither a target nor `-l -p` was given.
    pub fn mode(&self) -> Option<Mode> {
        if self.listen {
            return self.listen_port.map(|port| Mode::Listen { port });
        }
        match (&self.host, self.port) {
            (Some(host), Some(port)) => Some(Mode::Connect {
                host: host.clone(),
                port,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("linecat").chain(args.iter().copied()))
    }

    #[test]
    fn client_mode() {
        let cli = parse(&["127.0.0.1", "4444"]).unwrap();
        assert_eq!(
            cli.mode(),
            Some(Mode::Connect {
                host: "127.0.0.1".to_string(),
                port: 4444
            })
        );
    }

    #[test]
    fn server_mode() {
        let cli = parse(&["-l", "-p", "4444"]).unwrap();
        assert_eq!(cli.mode(), Some(Mode::Listen { port: 4444 }));
    }

    #[test]
    fn listen_requires_port() {
        assert!(parse(&["-l"]).is_err());
        assert!(parse(&["-p", "4444"]).is_err());
    }

    #[test]
    fn host_requires_port() {
        assert!(parse(&["example.com"]).is_err());
    }

    #[test]
    fn listen_conflicts_with_host() {
        assert!(parse(&["-l", "-p", "1", "example.com", "2"]).is_err());
    }

    #[test]
    fn no_arguments_has_no_mode() {
        let cli = parse(&[]).unwrap();
        assert_eq!(cli.mode(), None);
    }

    #[test]
    fn invalid_port_is_rejected() {
        assert!(parse(&["localhost", "70000"]).is_err());
        assert!(parse(&["localhost", "-1"]).is_err());
    }

    #[test]
    fn config_path_is_accepted() {
        let cli = parse(&["--config", "/tmp/linecat.toml", "host", "1"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/linecat.toml")));
    }
}
