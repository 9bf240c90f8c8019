//! Naver Search MCP Server: entry point.

use std::sync::Arc;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use naver_search::NaverClient;
use naver_search_mcp::config::ServerConfig;
use naver_search_mcp::tools::{Dispatcher, ToolRegistry};
use naver_search_mcp::transport::HttpTransport;
use naver_search_mcp::SessionManager;

#[derive(Parser)]
#[command(
    name = "naver-search-mcp",
    about = "MCP server for Naver search and DataLab analytics over streamable HTTP",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server over streamable HTTP (default).
    Serve(ServeArgs),

    /// Print server capabilities and tools as JSON.
    Info,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   naver-search-mcp completions bash > ~/.local/share/bash-completion/completions/naver-search-mcp
    ///   naver-search-mcp completions zsh > ~/.zfunc/_naver-search-mcp
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[derive(Args, Default)]
struct ServeArgs {
    /// Listen host [default: 0.0.0.0]
    #[arg(long)]
    host: Option<String>,

    /// Listen port. Also reads PORT env var [default: 8080]
    #[arg(short, long)]
    port: Option<u16>,

    /// Naver application client id. Also reads NAVER_CLIENT_ID.
    #[arg(long)]
    client_id: Option<String>,

    /// Naver application client secret. Also reads NAVER_CLIENT_SECRET.
    #[arg(long)]
    client_secret: Option<String>,

    /// Close sessions with no traffic for this many seconds (0 or unset: never).
    #[arg(long, value_name = "SECS")]
    session_idle_timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    std::panic::set_hook(Box::new(|info| {
        tracing::error!("Panic: {info}");
    }));

    match cli
        .command
        .unwrap_or_else(|| Commands::Serve(ServeArgs::default()))
    {
        Commands::Serve(args) => {
            let config = ServerConfig::resolve(
                args.host,
                args.port,
                args.client_id,
                args.client_secret,
                args.session_idle_timeout,
            )?;

            let client = Arc::new(NaverClient::new(config.credentials.clone())?);
            let dispatcher = Arc::new(Dispatcher::naver(client)?);
            tracing::info!(
                "Naver Search MCP server v{} ({} tools)",
                env!("CARGO_PKG_VERSION"),
                dispatcher.registry().len()
            );
            if let Some(timeout) = config.idle_timeout {
                tracing::info!("Idle sessions close after {}s", timeout.as_secs());
            }

            let manager = Arc::new(SessionManager::new(dispatcher));
            let transport = HttpTransport::new(manager).with_idle_timeout(config.idle_timeout);
            transport.run(&config.bind_addr()).await?;
        }

        Commands::Info => {
            let capabilities = naver_search_mcp::types::InitializeResult::default_result();
            let registry = ToolRegistry::builtin();
            let info = serde_json::json!({
                "server": capabilities.server_info,
                "protocol_version": capabilities.protocol_version,
                "capabilities": capabilities.capabilities,
                "tools": registry.list_tools().iter().map(|t| &t.name).collect::<Vec<_>>(),
                "tool_count": registry.len(),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "naver-search-mcp", &mut std::io::stdout());
        }
    }

    Ok(())
}
