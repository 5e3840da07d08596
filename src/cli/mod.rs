use clap::{ArgAction, Parser, Subcommand};

pub mod config;
pub mod init;
pub mod keygen;
pub mod list;
pub mod secret;
pub mod sign;
pub mod verify;
pub mod version;

#[derive(Parser)]
#[command(name = "feedgate")]
#[command(author = "feedgate contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Manage trust keys and feed signatures for gated replication", long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a new trust key and its signing secret
    Keygen {
        /// Emit the secret as a 24-word BIP-39 mnemonic instead of a hex seed
        #[arg(long)]
        mnemonic: bool,

        /// Write the secret to this file (mode 0600) instead of stderr
        #[arg(long)]
        output: Option<String>,
    },

    /// Write a default node configuration
    Init {
        /// Hex-encoded trust key shared by every node of the network
        #[arg(long)]
        trust_key: String,

        /// Config file path (default: ~/.local/share/feedgate/config.toml)
        #[arg(long)]
        config: Option<String>,

        /// Directory for the signature record (default: ~/.local/share/feedgate/store)
        #[arg(long)]
        store_path: Option<String>,

        /// File holding the signing secret, for writer nodes
        #[arg(long)]
        secret_file: Option<String>,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Sign a feed key and record the signature locally
    Sign {
        /// Hex-encoded feed public key
        #[arg(long)]
        feed: String,

        /// Config file path
        #[arg(long)]
        config: Option<String>,

        /// File holding the signing secret (overrides the config)
        #[arg(long)]
        secret_file: Option<String>,
    },

    /// Check a feed signature against a trust key
    Verify {
        /// Hex-encoded feed public key
        #[arg(long)]
        feed: String,

        /// Hex-encoded signature
        #[arg(long)]
        signature: String,

        /// Hex-encoded trust key (default: from config)
        #[arg(long)]
        trust_key: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<String>,
    },

    /// List persisted signatures and whether they verify
    List {
        /// Config file path
        #[arg(long)]
        config: Option<String>,
    },

    /// Show version information
    Version,
}

pub async fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Keygen { mnemonic, output } => keygen::execute(mnemonic, output),
        Commands::Init {
            trust_key,
            config,
            store_path,
            secret_file,
            force,
        } => init::execute(trust_key, config, store_path, secret_file, force),
        Commands::Sign {
            feed,
            config,
            secret_file,
        } => sign::execute(feed, config, secret_file).await,
        Commands::Verify {
            feed,
            signature,
            trust_key,
            config,
        } => verify::execute(feed, signature, trust_key, config),
        Commands::List { config } => list::execute(config).await,
        Commands::Version => {
            version::execute();
            Ok(())
        }
    }
}
