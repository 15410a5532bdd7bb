use anyhow::Result;
use std::sync::Arc;

use super::ChatRunner;
use crate::{
    account::ProfileUpdate,
    app::{load_config, load_config_file, AppState, Config},
    cli::{self, Cli, Commands},
    utils::log_warn,
};

/// Main runtime orchestrator
pub struct Orchestrator {
    cli: Cli,
    config: Config,
}

impl Orchestrator {
    /// Create a new orchestrator from CLI args
    pub fn new(cli: Cli) -> Result<Self> {
        let mut config = if let Some(config_path) = &cli.config {
            load_config_file(config_path)?
        } else {
            match load_config() {
                Ok(cfg) => cfg,
                Err(e) => {
                    log_warn("config", format!("Failed to load config: {}. Using defaults.", e));
                    Config::default()
                }
            }
        };

        if let Some(language) = cli.language {
            config.chat.language = language;
        }

        Ok(Self { cli, config })
    }

    /// Run the orchestrator
    pub async fn run(self) -> Result<()> {
        if let Commands::Init = self.cli.command {
            return cli::init();
        }

        let state = Arc::new(AppState::new(self.config)?);

        match &self.cli.command {
            Commands::Init => Ok(()),
            Commands::Login { email, password } => cli::login(&state, email, password).await,
            Commands::Register {
                nickname,
                email,
                password,
                code,
            } => cli::register(&state, nickname, email, password, code).await,
            Commands::Logout => cli::logout(&state),
            Commands::Profile {
                nickname,
                email,
                password,
                new_password,
            } => {
                let update = ProfileUpdate {
                    nickname: nickname.clone(),
                    email: email.clone(),
                    password: password.clone(),
                    new_password: new_password.clone(),
                };
                cli::profile(&state, update).await
            }
            Commands::DeleteAccount { yes } => cli::delete_account(&state, *yes).await,
            Commands::Avatars => cli::avatars(&state).await,
            Commands::Connect { code } => cli::connect(&state, code).await,
            Commands::Validate { code } => cli::validate(&state, code).await,
            Commands::History { avatar } => cli::history(&state, avatar).await,
            Commands::Chat { avatar, hidden } => {
                ChatRunner::new(Arc::clone(&state), avatar.clone())
                    .run(*hidden)
                    .await
            }
        }
    }
}
