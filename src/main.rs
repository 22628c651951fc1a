mod collect;
mod env;
mod error;
mod output;
mod paths;
mod store;
mod utils;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{debug, error, info};
use std::fmt;
use std::io::{self, IsTerminal, Write};
use std::process;

use crate::error::Error;
use crate::store::{BasicAuth, ConsulClient, KvStore};

/// Load environment variables from the Consul KV store
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Set logging level
    #[arg(long, value_enum, default_value_t = LogLevel::Warn, global = true)]
    log_level: LogLevel,

    #[command(flatten)]
    connection: ConnectionArgs,

    /// KV paths to read variables from (repeatable or comma separated)
    #[arg(
        short,
        long = "path",
        value_name = "PATH",
        env = "CONSUL_ENV_PATH",
        value_delimiter = ',',
        global = true
    )]
    paths: Vec<String>,

    /// Echo progress and emitted lines to stderr
    #[arg(short, long, env = "CONSUL_ENV_VERBOSE", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct ConnectionArgs {
    /// Consul HTTP address
    #[arg(long, env = "CONSUL_ENV_ADDR", default_value = "127.0.0.1:8500", global = true)]
    addr: String,

    /// Consul ACL token
    #[arg(long, env = "CONSUL_ENV_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// HTTP basic auth as user:pass
    #[arg(long, env = "CONSUL_ENV_AUTH", hide_env_values = true, global = true)]
    auth: Option<String>,

    /// Connect over https
    #[arg(long, env = "CONSUL_ENV_SSL", global = true)]
    ssl: bool,
}

fn redact(secret: &Option<String>) -> Option<&'static str> {
    secret.as_ref().map(|_| "<redacted>")
}

impl fmt::Debug for ConnectionArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionArgs")
            .field("addr", &self.addr)
            .field("token", &redact(&self.token))
            .field("auth", &redact(&self.auth))
            .field("ssl", &self.ssl)
            .finish()
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print variables found directly in the requested paths
    Get {
        /// Prefix each line with `export`
        #[arg(long, env = "CONSUL_ENV_EXPORT")]
        export: bool,

        /// Print a single JSON object instead of shell lines
        #[arg(long, env = "CONSUL_ENV_JSON")]
        json: bool,
    },
    /// List the keys directly below the requested paths
    Keys,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn store_config(args: &ConnectionArgs) -> crate::error::Result<store::Config> {
    let mut config = store::Config::new(args.addr.clone());
    config.token = args.token.clone();
    config.ssl = args.ssl;
    config.auth = match args.auth.as_deref() {
        Some(auth) if !auth.is_empty() => Some(BasicAuth::parse(auth)?),
        _ => None,
    };
    Ok(config)
}

/// Query, flatten, select and print variables for the requested paths
fn get<S: KvStore + ?Sized, W: Write, D: Write>(
    store: &S,
    requested: &[String],
    options: output::Options,
    out: &mut W,
    diag: &mut D,
    out_is_terminal: bool,
) -> Result<()> {
    let prefixes = paths::canonicalize(requested);
    let entries = collect::collect(store, &prefixes, options.verbose, diag)?;
    let (env_map, order) = env::flatten(&entries, diag)?;
    let selection = env::select(&env_map, requested);
    output::emit(&selection, &order, options, out, diag, out_is_terminal)?;
    Ok(())
}

/// Print the immediate child keys of the requested paths, one per line
fn keys<S: KvStore + ?Sized, W: Write, D: Write>(
    store: &S,
    requested: &[String],
    verbose: bool,
    out: &mut W,
    diag: &mut D,
) -> Result<()> {
    let prefixes = paths::canonicalize(requested);
    for key in collect::collect_keys(store, &prefixes, verbose, diag)? {
        writeln!(out, "{}", key)?;
    }
    out.flush()?;
    Ok(())
}

/// Announce the target address; credentials are never echoed
fn connecting<D: Write>(config: &store::Config, verbose: bool, diag: &mut D) -> io::Result<()> {
    info!("Using Consul at {}", config.base_url());
    if verbose {
        writeln!(diag, "Connecting to {}", config.base_url())?;
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    if cli.paths.is_empty() {
        return Err(Error::Configuration(String::from("At least one --path is required")).into());
    }

    let config = store_config(&cli.connection)?;

    let stdout = io::stdout();
    let out_is_terminal = stdout.is_terminal();
    let mut out = stdout.lock();
    let mut diag = io::stderr().lock();

    connecting(&config, cli.verbose, &mut diag)?;
    let client = ConsulClient::new(&config);

    match cli.command {
        Command::Get { export, json } => {
            let options = output::Options {
                json,
                export,
                verbose: cli.verbose,
            };
            get(&client, &cli.paths, options, &mut out, &mut diag, out_is_terminal)
        }
        Command::Keys => keys(&client, &cli.paths, cli.verbose, &mut out, &mut diag),
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logger
    env_logger::Builder::new()
        .filter_level(cli.log_level.to_filter())
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    debug!("CLI arguments: {:#?}", cli);

    if let Err(err) = run(&cli) {
        error!("{:#}", err);
        let code = err.downcast_ref::<Error>().map_or(1, Error::exit_code);
        process::exit(code);
    }
}
