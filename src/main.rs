use std::path::PathBuf;

use clap::Parser;
use color_eyre::Result;
use dialoguer::Select;

use statify::auth::Listener;
use statify::browser::SystemBrowser;
use statify::config::{Config, Credentials};
use statify::storage::{FileStorage, MemoryStorage};
use statify::ui::{Presenter, Terminal};
use statify::{logging, App, Environment, Shared};

/// Show your Spotify profile, top artists and recently played artists
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Yaml file overriding the redirect uri, scopes or endpoints
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log debug output to the log file
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy)]
enum Choice {
    Login,
    Reload,
    Logout,
    Quit,
}

impl Choice {
    const ALL: [Choice; 4] = [Choice::Login, Choice::Reload, Choice::Logout, Choice::Quit];

    fn label(self) -> &'static str {
        match self {
            Choice::Login => "Login",
            Choice::Reload => "Reload",
            Choice::Logout => "Logout",
            Choice::Quit => "Quit",
        }
    }
}

fn load_config(cli: &Cli) -> statify::Result<Config> {
    let builder = match &cli.config {
        Some(path) => statify::config::ConfigBuilder::from_file(path)?,
        None => Config::load_with_fallback(["config.yml", "config.yaml"])?,
    };
    builder
        .client_id(Credentials::from_env().map(|c| c.client_id))
        .compile()
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            log::error!("{err}");
            Terminal.show_status(&err.to_string());
            return Ok(());
        }
    };

    let browser = Shared::new(SystemBrowser::default());
    let env = Environment {
        local: Shared::new(FileStorage::cache()?),
        session: Shared::new(MemoryStorage::default()),
        navigator: browser.clone(),
        http: reqwest::Client::new(),
    };
    let mut app = App::new(&config, env, Terminal)?;
    app.init().await;

    // Bound once for the whole run so every login reuses the same redirect port
    let mut listener = Listener::bind(&config.redirect_uri).await?;

    let labels = Choice::ALL.map(Choice::label);
    loop {
        let index = Select::new()
            .with_prompt("statify")
            .items(&labels)
            .default(0)
            .interact()?;

        match Choice::ALL[index] {
            Choice::Login => {
                listener.discard_pending();
                if !app.login() {
                    continue;
                }
                if let Some(location) = listener.next().await {
                    browser.arrive(location);
                    app.init().await;
                }
            }
            Choice::Reload => app.init().await,
            Choice::Logout => app.logout(),
            Choice::Quit => break,
        }
    }

    Ok(())
}
