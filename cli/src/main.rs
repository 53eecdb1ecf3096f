mod repl;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use hello_dapp_core::commands::Command;
use hello_dapp_core::config::DEFAULT_WALLET_URL;
use hello_dapp_core::network::HttpNetwork;
use hello_dapp_core::{memory, Address, DappConfig, Network, NetworkConfig, RpcWallet, Session};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "hello-dapp",
    about = "Read and update the HelloWorld contract message from your terminal",
    version
)]
pub(crate) struct Cli {
    /// Network: mainnet, goerli or sepolia
    #[arg(long, default_value = "goerli")]
    network: Network,

    /// Custom JSON-RPC node URL (overrides --network)
    #[arg(long, env = "HELLO_DAPP_RPC_URL")]
    rpc_url: Option<String>,

    /// Alchemy API key (falls back to the rate-limited demo key)
    #[arg(long, env = "ALCHEMY_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// HelloWorld contract address
    #[arg(long, env = "HELLO_DAPP_CONTRACT")]
    contract: Option<Address>,

    /// EIP-1193 wallet JSON-RPC endpoint
    #[arg(long, env = "HELLO_DAPP_WALLET_URL", default_value = DEFAULT_WALLET_URL)]
    wallet_url: String,

    /// Allow connecting to non-HTTPS endpoints
    #[arg(long)]
    insecure: bool,

    /// Seconds to wait for wallet approval (0 waits indefinitely)
    #[arg(long, default_value_t = 300)]
    approval_timeout: u64,

    /// Use an in-process chain and wallet instead of a node
    #[arg(long)]
    demo: bool,

    /// Run a single command and exit
    #[arg(long)]
    cmd: Option<String>,

    /// Output in JSON format (useful with --cmd)
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn network_config(&self) -> Result<NetworkConfig> {
        if let Some(url) = &self.rpc_url {
            return Ok(NetworkConfig {
                network: Network::Custom,
                custom_url: Some(url.clone()),
                api_key: None,
            });
        }
        if self.network == Network::Custom {
            bail!("--network custom requires --rpc-url.");
        }
        Ok(NetworkConfig {
            network: self.network,
            custom_url: None,
            api_key: self.api_key.clone(),
        })
    }

    pub(crate) fn dapp_config(&self) -> Result<DappConfig> {
        let defaults = DappConfig::default();
        Ok(DappConfig {
            network: self.network_config()?,
            contract_address: self.contract.unwrap_or(defaults.contract_address),
            wallet_url: self.wallet_url.clone(),
            allow_insecure: self.insecure,
            approval_timeout: match self.approval_timeout {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            ..defaults
        })
    }

    /// Build the session against either the in-process demo chain or the
    /// configured node and wallet endpoint.
    pub(crate) async fn open_session(&self) -> Result<Session> {
        let config = self.dapp_config()?;
        if self.demo {
            let (chain, wallet) = memory::demo(&config);
            return Ok(Session::new(config, Arc::new(chain), Some(Arc::new(wallet))));
        }
        let network = Arc::new(HttpNetwork::new(&config));
        let wallet = RpcWallet::detect(&config).await;
        Ok(Session::new(config, network, wallet))
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    if let Some(cmd_str) = &cli.cmd {
        // One-shot mode
        run_oneshot(&cli, cmd_str).await
    } else {
        // REPL mode
        repl::run_repl(&cli).await
    }
}

async fn run_oneshot(cli: &Cli, cmd_str: &str) -> Result<()> {
    let command = Command::parse(cmd_str)?;
    if command == Command::Exit {
        return Ok(());
    }

    let session = cli.open_session().await?;
    session.bootstrap().await;

    let output = command.execute(&session, cli.json).await?;
    if !output.is_empty() {
        println!("{output}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_goerli_with_timeout() {
        let cli = Cli::parse_from(["hello-dapp"]);
        let config = cli.dapp_config().unwrap();
        assert_eq!(config.network.network, Network::Goerli);
        assert_eq!(config.approval_timeout, Some(Duration::from_secs(300)));
    }

    #[test]
    fn rpc_url_selects_custom_network() {
        let cli = Cli::parse_from(["hello-dapp", "--rpc-url", "http://127.0.0.1:8545"]);
        let config = cli.dapp_config().unwrap();
        assert_eq!(config.network.network, Network::Custom);
        assert_eq!(
            config.network.custom_url.as_deref(),
            Some("http://127.0.0.1:8545")
        );
    }

    #[test]
    fn zero_timeout_waits_indefinitely() {
        let cli = Cli::parse_from(["hello-dapp", "--approval-timeout", "0"]);
        assert_eq!(cli.dapp_config().unwrap().approval_timeout, None);
    }

    #[test]
    fn custom_network_needs_url() {
        let cli = Cli::parse_from(["hello-dapp", "--network", "custom"]);
        assert!(cli.dapp_config().is_err());
    }

    #[test]
    fn unknown_network_is_rejected() {
        assert!(Cli::try_parse_from(["hello-dapp", "--network", "ropsten"]).is_err());
    }
}
