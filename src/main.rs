//! MCP token tester binary entry point.

use mcp_token_tester::cli::{self, servers, tools, Cli, Commands};
use mcp_token_tester::config::{ConfigStore, Credentials};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    init_tracing(cli.verbose);

    let credentials = Credentials::from_env();
    let mut store = ConfigStore::open(&cli.config);
    let mut out = std::io::stdout();

    let result = match cli.command {
        Commands::AddServer(args) => servers::handle_add(&mut store, args, &mut out),
        Commands::ListServers => servers::handle_list(&store, &mut out),
        Commands::RemoveServer { name } => servers::handle_remove(&mut store, &name, &mut out),
        Commands::SetDefault { name } => servers::handle_set_default(&mut store, &name, &mut out),
        Commands::Connect(args) => tools::handle_connect(&store, args, &mut out).await,
        Commands::CallTool(args) => {
            tools::handle_call_tool(&store, args, &credentials, &mut out).await
        }
        Commands::Interactive(args) => {
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            tools::handle_interactive(&store, args, credentials, input, &mut out).await
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", cli::format_error_help(&e));
        std::process::exit(1);
    }
}

/// Log to stderr so tool output on stdout stays clean. `RUST_LOG` wins over
/// `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
