/// CLI argument parsing and command handling - Gateway
mod args;
mod commands;

pub use args::{Cli, Commands};
pub use commands::{
    avatars, connect, delete_account, history, init, login, logout, print_message, profile,
    register, validate,
};
