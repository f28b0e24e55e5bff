//! Pisweep CLI - derive a Pi account from its mnemonic and move funds out
//!
//!   pisweep address                         → {"address": "G..."}
//!   pisweep balance                         → {"address": "G...", "balance": "10.5"}
//!   pisweep send --to <G...> [--amount <n>] → send report with elapsed time
//!   pisweep send --to <G...> --sweep        → everything above the reserve
//!   pisweep serve [--port <p>]              → HTTP front end
//!
//! The mnemonic comes from `--mnemonic` or `PISWEEP_MNEMONIC` (a `.env` file
//! in the working directory is honoured). It is never printed.

use anyhow::{anyhow, bail, Context, Result};
use pisweep::config::{load_dotenv, ClientConfig};
use pisweep::logging::init_logging;
use pisweep::{Amount, HorizonClient, Progress, SendOrder, SendService};
use serde_json::{json, Value};
use std::env;
use std::future::Future;
use std::io::{IsTerminal, Write};
use std::sync::Arc;
use tracing::info;
use zeroize::Zeroizing;

fn main() {
    let args: Vec<String> = env::args().collect();
    let opts = ParsedArgs::parse(&args[1..]);
    init_logging();

    if opts.help {
        print_usage();
        return;
    }

    if opts.version {
        println!("pisweep {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let result = match opts.command.as_deref() {
        Some("address") => cmd_address(&opts),
        Some("balance") => cmd_balance(&opts),
        Some("send") => cmd_send(&opts),
        Some("serve") => cmd_serve(&opts),
        Some(cmd) => Err(anyhow!("Unknown command: {}", cmd)),
        None => {
            print_usage();
            return;
        }
    };

    let pretty = opts.pretty || std::io::stdout().is_terminal();
    match result {
        Ok(output) => {
            println!("{}", render(&output, pretty));
            if output.get("status").and_then(Value::as_str) == Some("failure") {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{}", render(&json!({"error": format!("{:#}", e)}), pretty));
            std::process::exit(1);
        }
    }
}

fn render(value: &Value, pretty: bool) -> String {
    let rendered = if pretty { serde_json::to_string_pretty(value) } else { serde_json::to_string(value) };
    rendered.unwrap_or_else(|_| value.to_string())
}

#[derive(Default)]
struct ParsedArgs {
    command: Option<String>,
    mnemonic: Option<Zeroizing<String>>,
    to: Option<String>,
    amount: Option<String>,
    sweep: bool,
    horizon_url: Option<String>,
    port: Option<u16>,
    pretty: bool,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Self {
        load_dotenv();

        let mut opts = ParsedArgs::default();
        let mut positional = Vec::new();
        let mut i = 0;

        while i < args.len() {
            let arg = &args[i];
            let value = args.get(i + 1).cloned();
            match arg.as_str() {
                "--help" | "-h" => opts.help = true,
                "--version" | "-V" => opts.version = true,
                "--pretty" => opts.pretty = true,
                "--sweep" => opts.sweep = true,
                "--mnemonic" | "-m" if value.is_some() => {
                    opts.mnemonic = value.map(Zeroizing::new);
                    i += 1;
                }
                "--to" | "-t" if value.is_some() => {
                    opts.to = value;
                    i += 1;
                }
                "--amount" | "-a" if value.is_some() => {
                    opts.amount = value;
                    i += 1;
                }
                "--horizon" if value.is_some() => {
                    opts.horizon_url = value;
                    i += 1;
                }
                "--port" | "-p" if value.is_some() => {
                    opts.port = value.and_then(|p| p.parse().ok());
                    i += 1;
                }
                _ if !arg.starts_with('-') => positional.push(arg.clone()),
                _ => {} // Ignore unknown flags
            }
            i += 1;
        }

        if !positional.is_empty() {
            opts.command = Some(positional.remove(0));
        }

        // Environment is lower priority than flags
        if opts.mnemonic.is_none() {
            opts.mnemonic = env::var("PISWEEP_MNEMONIC").ok().filter(|s| !s.trim().is_empty()).map(Zeroizing::new);
        }

        opts
    }

    fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::from_env();
        if let Some(url) = &self.horizon_url {
            config = config.with_horizon_url(url);
        }
        if let Some(port) = self.port {
            config = config.with_port(port);
        }
        config
    }

    fn mnemonic(&self) -> Result<&str> {
        self.mnemonic
            .as_deref()
            .map(String::as_str)
            .ok_or_else(|| anyhow!("Provide --mnemonic or set PISWEEP_MNEMONIC"))
    }
}

fn print_usage() {
    println!(
        r#"pisweep - Pi Network account sweeper

USAGE:
    pisweep <command> [options]

COMMANDS:
    address                 Print the account address derived from the mnemonic
    balance                 Print the native balance of that account
    send                    Send a payment, retrying until accepted
    serve                   Start HTTP server

OPTIONS:
    --mnemonic, -m <words>  24-word mnemonic (env: PISWEEP_MNEMONIC)
    --horizon <url>         Horizon URL (env: PISWEEP_HORIZON_URL)

SEND OPTIONS:
    --to, -t <address>      Destination account (G...)
    --amount, -a <amount>   Amount to send (default: everything above 0.01)
    --sweep                 Send everything above the 0.01 reserve

SERVER OPTIONS:
    --port, -p <port>       Server port (default: 8080, env: PISWEEP_PORT, then PORT)

OUTPUT OPTIONS:
    --pretty                Pretty-print JSON (default for tty)
    --version, -V           Print version

ENVIRONMENT:
    PISWEEP_NETWORK_PASSPHRASE   Network passphrase (default: "Pi Network")
    PISWEEP_LOG_JSON=1           JSON log lines on stderr
    RUST_LOG                     Log filter (default: info)

EXAMPLES:
    pisweep address
    pisweep send --to GDRXE2BQUC3AZNPVFSCEZ76NJ3WWL25FYFK6RGZGIEKWE4SOOHSUJUJ6 --sweep
    pisweep serve --port 9000
"#
    );
}

fn service(config: &ClientConfig) -> SendService<HorizonClient> {
    let ledger = Arc::new(HorizonClient::new(&config.horizon_url));
    SendService::new(ledger, config.send_config())
}

fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let rt = tokio::runtime::Runtime::new().context("Failed to create runtime")?;
    Ok(rt.block_on(future))
}

fn cmd_address(opts: &ParsedArgs) -> Result<Value> {
    let address = service(&opts.client_config()).address(opts.mnemonic()?)?;
    Ok(json!({"address": address}))
}

fn cmd_balance(opts: &ParsedArgs) -> Result<Value> {
    let service = service(&opts.client_config());
    let mnemonic = opts.mnemonic()?;
    let (address, balance) = block_on(service.balance(mnemonic))??;
    Ok(json!({"address": address, "balance": balance}))
}

fn cmd_send(opts: &ParsedArgs) -> Result<Value> {
    let Some(to) = opts.to.as_deref() else { bail!("Provide --to <address>") };
    let amount = match opts.amount.as_deref() {
        Some(raw) => raw.parse::<Amount>().with_context(|| format!("Invalid --amount {}", raw))?,
        None => Amount::ZERO,
    };
    let order = SendOrder::new(opts.mnemonic()?, to).with_amount(amount).with_sweep(opts.sweep);

    let service = service(&opts.client_config());
    let report = block_on(service.send(&order, |p: Progress| {
        let mut stderr = std::io::stderr();
        let _ = write!(stderr, "\rAttempts: {}/{}", p.attempt, p.max_attempts);
        let _ = stderr.flush();
    }))?;
    eprintln!();

    Ok(serde_json::to_value(&report)?)
}

fn cmd_serve(opts: &ParsedArgs) -> Result<Value> {
    use pisweep::install_signal_handlers;
    use pisweep::server::create_router;

    let config = opts.client_config();
    let service = service(&config);

    block_on(async move {
        let shutdown = install_signal_handlers();
        let router = create_router(service, "pisweep");
        let addr = format!("0.0.0.0:{}", config.port);

        info!("Pisweep server listening on http://{}", addr);
        info!(horizon = %config.horizon_url, "Endpoints:");
        info!("  GET  /health  - Health check");
        info!("  POST /send    - {{mnemonic, destination, amount?, sweep?}}");

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown.wait().await;
                info!("Shutdown signal received, stopping server...");
            })
            .await
            .context("Server error")?;

        Ok::<(), anyhow::Error>(())
    })??;

    Ok(json!({"status": "stopped"}))
}
