mod messages;
mod state;
mod styles;
mod update;
mod views;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use iced::theme::Palette;
use iced::{Color, Element, Task, Theme};
use tracing_subscriber::EnvFilter;

use hello_dapp_core::config::DEFAULT_WALLET_URL;
use hello_dapp_core::{Address, DappConfig, Network, NetworkConfig, Session, SessionState};

use messages::{Message, SessionHandle};

// Dark palette
const BG: Color = Color::from_rgb(0.051, 0.067, 0.090); // #0d1117
const SURFACE: Color = Color::from_rgb(0.114, 0.157, 0.227); // #1d283a
const BORDER: Color = Color::from_rgb(0.204, 0.259, 0.337); // #344256
const ACTIVE: Color = Color::from_rgb(0.086, 0.137, 0.251); // #162340
const MUTED: Color = Color::from_rgb(0.396, 0.459, 0.545); // #65758b
const PRIMARY: Color = Color::from_rgb(0.961, 0.510, 0.125); // #f58220

#[derive(Parser, Debug, Clone)]
#[command(name = "hello-dapp-gui", about = "Desktop front-end for the HelloWorld contract", version)]
struct Args {
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
}

impl Args {
    fn dapp_config(&self) -> DappConfig {
        let network = match &self.rpc_url {
            Some(url) => NetworkConfig {
                network: Network::Custom,
                custom_url: Some(url.clone()),
                api_key: None,
            },
            None => NetworkConfig {
                network: self.network,
                custom_url: None,
                api_key: self.api_key.clone(),
            },
        };
        let defaults = DappConfig::default();
        DappConfig {
            network,
            contract_address: self.contract.unwrap_or(defaults.contract_address),
            wallet_url: self.wallet_url.clone(),
            allow_insecure: self.insecure,
            approval_timeout: match self.approval_timeout {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            ..defaults
        }
    }
}

fn main() -> iced::Result {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    iced::application(App::new, App::update, App::view)
        .title("Hello World dApp")
        .theme(App::theme)
        .window_size((640.0, 560.0))
        .run()
}

// -- App state --

struct App {
    config: DappConfig,
    demo: bool,
    session: Option<Arc<Session>>,

    // Mirror of the session state, refreshed from its watch channel
    state: SessionState,
    draft: String,

    // UI state
    loading: bool,
    busy: bool,
    notice: Option<String>,
    error_message: Option<String>,

    clipboard: Option<arboard::Clipboard>,
    theme: Theme,
}

impl App {
    fn new() -> (Self, Task<Message>) {
        let args = Args::parse();
        let config = args.dapp_config();

        let app = Self {
            config: config.clone(),
            demo: args.demo,
            session: None,
            state: SessionState::default(),
            draft: String::new(),
            loading: true,
            busy: false,
            notice: None,
            error_message: None,
            clipboard: arboard::Clipboard::new().ok(),
            theme: Theme::custom(
                "HelloDapp".to_string(),
                Palette {
                    background: BG,
                    text: Color::from_rgb(0.988, 0.988, 0.988),
                    primary: PRIMARY,
                    success: Color::from_rgb(0.059, 0.757, 0.718),
                    warning: Color::from_rgb(1.0, 0.757, 0.027),
                    danger: Color::from_rgb(0.906, 0.192, 0.192),
                },
            ),
        };

        let demo = args.demo;
        let task = Task::perform(
            async move { state::open_session(config, demo).await },
            |session| Message::SessionReady(SessionHandle(Arc::new(session))),
        );
        (app, task)
    }

    fn theme(&self) -> Theme {
        self.theme.clone()
    }

    fn view(&self) -> Element<'_, Message> {
        self.view_dapp()
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if let Some(session) = &self.session {
            session.shutdown();
        }
    }
}
