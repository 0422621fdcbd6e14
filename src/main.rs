use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use throttled_rest::config::{Config, DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES};
use throttled_rest::{routes, HttpClient, RequestOptions, RouteArgs};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "throttled-rest", version, about = "Rate-limit-aware REST client")]
struct Cli {
    /// Bot token used for the Authorization header
    #[arg(long, env = "REST_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[arg(long, env = "REST_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Retries for 429, 5xx and network failures
    #[arg(long, env = "REST_MAX_RETRIES", default_value_t = DEFAULT_MAX_RETRIES)]
    max_retries: u32,

    #[arg(long, env = "REST_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every route in the catalog
    Routes,

    /// Dispatch a catalog route and print the response
    Call {
        /// Operation name, e.g. GUILDS_GET
        route: String,

        /// Placeholder values as name=value
        #[arg(value_parser = parse_pair)]
        args: Vec<(String, String)>,

        /// Query parameter as name=value (repeatable)
        #[arg(long = "query", value_parser = parse_pair)]
        query: Vec<(String, String)>,

        /// Extra header as name:value (repeatable)
        #[arg(long = "header", value_parser = parse_header)]
        headers: Vec<(String, String)>,

        /// JSON request body
        #[arg(long)]
        json: Option<String>,
    },
}

impl Cli {
    /// Client configuration for the options given on the command line
    fn config(&self) -> Config {
        let mut config = Config::new(self.token.clone().unwrap_or_default()).with_base_url(&self.base_url);
        config.max_retries = self.max_retries;
        config.log_level = self.log_level.clone();
        config
    }
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .ok_or_else(|| format!("expected name=value, got `{}`", raw))
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    raw.split_once(':')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .ok_or_else(|| format!("expected name:value, got `{}`", raw))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let config = cli.config();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("throttled_rest={}", config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Command::Routes => {
            for (name, route) in routes::CATALOG {
                println!("{:<32} {}", name, route);
            }
        }
        Command::Call {
            route,
            args,
            query,
            headers,
            json,
        } => {
            if config.token.is_empty() {
                return Err(anyhow!("A token is required (--token or REST_TOKEN)"));
            }

            let client = HttpClient::new(config)
                .map_err(|e| anyhow!("Failed to create client: {}", e))?;

            let args: RouteArgs = args.into_iter().collect();
            let mut options = RequestOptions::new();
            for (name, value) in query {
                options = options.query(name, value);
            }
            for (name, value) in headers {
                options = options.try_header(&name, &value)?;
            }
            if let Some(json) = json {
                let body = serde_json::from_str(&json).context("--json is not valid JSON")?;
                options = options.json(body);
            }

            tracing::info!(route = %route, "Dispatching request");
            let response = client.call(&route, &args, &options).await?;

            println!("{}", response.status());
            println!("{}", response.text().await?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_options_reach_config() {
        let cli = Cli::try_parse_from([
            "throttled-rest",
            "--token",
            "secret",
            "--base-url",
            "http://localhost:8080/api",
            "--max-retries",
            "2",
            "--log-level",
            "debug",
            "routes",
        ])
        .unwrap();

        let config = cli.config();
        assert_eq!(config.token, "secret");
        assert_eq!(config.base_url, "http://localhost:8080/api");
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.log_level, "debug");
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_call_arguments() {
        let cli = Cli::try_parse_from([
            "throttled-rest",
            "call",
            "GUILDS_GET",
            "guild=123",
            "--query",
            "with_counts=true",
            "--header",
            "X-Audit-Log-Reason: cleanup",
        ])
        .unwrap();

        match cli.command {
            Command::Call { route, args, query, headers, json } => {
                assert_eq!(route, "GUILDS_GET");
                assert_eq!(args, vec![("guild".to_string(), "123".to_string())]);
                assert_eq!(query, vec![("with_counts".to_string(), "true".to_string())]);
                assert_eq!(headers, vec![("X-Audit-Log-Reason".to_string(), "cleanup".to_string())]);
                assert!(json.is_none());
            }
            Command::Routes => panic!("expected call"),
        }
    }
}
