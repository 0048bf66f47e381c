//! Server configuration from command-line flags and environment variables

use clap::Parser;

/// Runtime configuration for the live-posts server
#[derive(Parser, Debug, Clone)]
#[command(name = "live-posts", version, about = "GraphQL post service with live queries")]
pub struct ServerConfig {
    /// Address to bind on
    #[arg(long, env = "LIVE_POSTS_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port number
    #[arg(long, env = "LIVE_POSTS_PORT", default_value_t = 8911)]
    pub port: u16,

    /// Log filter directives (RUST_LOG syntax)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_filter: String,

    /// Pending re-runs buffered per live query
    #[arg(
        long,
        env = "LIVE_POSTS_LIVE_QUERY_BUFFER",
        default_value_t = 16,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub live_query_buffer: u16,

    /// Serve without a live-query store; writes skip invalidation
    #[arg(long, env = "LIVE_POSTS_DISABLE_LIVE_QUERIES")]
    pub disable_live_queries: bool,
}

impl ServerConfig {
    /// `host:port` string the listener binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8911,
            log_filter: "info".to_string(),
            live_query_buffer: 16,
            disable_live_queries: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let config = ServerConfig::try_parse_from([
            "live-posts",
            "--host",
            "0.0.0.0",
            "--port",
            "9000",
            "--live-query-buffer",
            "4",
            "--disable-live-queries",
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:9000");
        assert_eq!(config.live_query_buffer, 4);
        assert!(config.disable_live_queries);
    }

    #[test]
    fn test_zero_buffer_rejected() {
        let result = ServerConfig::try_parse_from(["live-posts", "--live-query-buffer", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_default_bind_address() {
        assert_eq!(ServerConfig::default().bind_address(), "127.0.0.1:8911");
    }

    #[test]
    fn test_command_definition() {
        use clap::CommandFactory;
        ServerConfig::command().debug_assert();
    }
}
