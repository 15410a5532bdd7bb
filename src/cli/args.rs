use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::app::Language;

#[derive(Parser, Debug)]
#[command(name = "hamo")]
#[command(version)]
#[command(about = "Chat with your Hamo therapy avatars from the terminal", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Language replies should be written in
    #[arg(short, long, value_enum)]
    pub language: Option<Language>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default configuration file
    Init,
    /// Sign in and cache the access token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "HAMO_PASSWORD")]
        password: String,
    },
    /// Create an account using a professional's invitation code
    Register {
        #[arg(long)]
        nickname: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "HAMO_PASSWORD")]
        password: String,
        /// Invitation code from the professional
        #[arg(long)]
        code: String,
    },
    /// Forget cached credentials
    Logout,
    /// Change nickname, email, or password
    Profile {
        #[arg(long)]
        nickname: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// Current password, required by the backend for a password change
        #[arg(long, env = "HAMO_PASSWORD")]
        password: Option<String>,
        #[arg(long, env = "HAMO_NEW_PASSWORD")]
        new_password: Option<String>,
    },
    /// Permanently delete the account and forget cached credentials
    DeleteAccount {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// List connected avatars, most recent chat first
    Avatars,
    /// Connect with another avatar
    Connect {
        /// Invitation code
        code: String,
    },
    /// Check an invitation code without using it
    Validate {
        /// Invitation code
        code: String,
    },
    /// Print the transcript of a fresh session with an avatar
    History {
        #[arg(short, long)]
        avatar: String,
    },
    /// Chat with an avatar; each input line is one message
    Chat {
        #[arg(short, long)]
        avatar: String,
        /// Hide this session's transcript from the professional
        #[arg(long)]
        hidden: bool,
    },
}
