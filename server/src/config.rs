use clap::Parser;
use shared::DEFAULT_PORT;
use std::time::Duration;

/// Command line configuration for the game server.
///
/// Only the network surface and connection timeouts are configurable; board
/// dimensions, tank stats and obstacle rules are fixed game constants.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct ServerConfig {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    pub host: String,

    /// Server port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Drop a client after this many seconds without a message (0 disables)
    #[arg(long, default_value_t = 600)]
    pub idle_timeout_secs: u64,

    /// Give up on a client whose socket stays unwritable for this long
    #[arg(long, default_value_t = 5000)]
    pub send_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            idle_timeout_secs: 600,
            send_timeout_ms: 5000,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            idle_timeout: (self.idle_timeout_secs > 0)
                .then(|| Duration::from_secs(self.idle_timeout_secs)),
            send_timeout: Duration::from_millis(self.send_timeout_ms.max(1)),
        }
    }
}

/// Timeouts applied to every client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub idle_timeout: Option<Duration>,
    pub send_timeout: Duration,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        ServerConfig::default().connection_settings()
    }
}
