use anyhow::{Context, Result};
use chrono::Local;
use colored::Colorize;

use crate::{
    account::ProfileUpdate,
    app::{init_config, AppState},
    inbox::ConnectedAvatar,
    session::{Message, Sender},
    utils::{log_debug, log_info},
};

/// Print one transcript entry
pub fn print_message(message: &Message, avatar_name: &str) {
    if message.is_loading {
        return;
    }
    match message.sender {
        Sender::Client => println!("{} {}", format!("[{}] You:", message.timestamp).blue(), message.text),
        Sender::Avatar => println!(
            "{} {}",
            format!("[{}] {}:", message.timestamp, avatar_name).magenta(),
            message.text
        ),
    }
}

fn print_avatar(avatar: &ConnectedAvatar) {
    let label = avatar.time_label(Local::now()).unwrap_or_default();
    println!("  {} {} {}", avatar.id.dimmed(), avatar.name.green().bold(), label.dimmed());
    if let Some(pro) = &avatar.pro_name {
        println!("      {}", pro);
    }
    match avatar.preview() {
        Some(preview) => println!("      {}", preview.dimmed()),
        None => println!("      {}", "No messages yet".dimmed()),
    }
}

pub fn init() -> Result<()> {
    let path = init_config()?;
    println!("Configuration at: {}", path.display());
    Ok(())
}

pub async fn login(state: &AppState, email: &str, password: &str) -> Result<()> {
    let outcome = state
        .account
        .login_client(email, password)
        .await
        .context("Login failed")?;

    let name = outcome
        .user
        .as_ref()
        .and_then(|u| u.nickname.clone())
        .unwrap_or_else(|| email.to_string());
    log_info("auth", format!("logged in as {}", email));
    println!("Welcome back, {}!", name.green());
    state.add_avatars(outcome.connected_avatars).await;
    Ok(())
}

pub async fn register(state: &AppState, nickname: &str, email: &str, password: &str, code: &str) -> Result<()> {
    let registration = state
        .account
        .register_client(nickname, email, password, code)
        .await
        .context("Registration failed")?;

    println!("Account created for {}", email.green());
    if let Some(avatar) = registration.connected_avatar {
        println!("Connected with {}", avatar.name.green());
    }
    Ok(())
}

pub fn logout(state: &AppState) -> Result<()> {
    state.account.logout()?;
    log_info("auth", "credentials cleared");
    println!("Logged out.");
    Ok(())
}

pub async fn profile(state: &AppState, update: ProfileUpdate) -> Result<()> {
    if update.nickname.is_none() && update.email.is_none() && update.new_password.is_none() {
        println!("Nothing to change. Pass --nickname, --email or --new-password.");
        return Ok(());
    }

    let user = state
        .account
        .update_profile(&update)
        .await
        .context("Profile update failed")?;

    let name = user
        .and_then(|u| u.nickname)
        .unwrap_or_else(|| "your account".to_string());
    println!("Profile updated for {}", name.green());
    Ok(())
}

pub async fn delete_account(state: &AppState, confirmed: bool) -> Result<()> {
    if !confirmed {
        println!(
            "{}",
            "This deletes your account and chat history. Re-run with --yes to confirm.".yellow()
        );
        return Ok(());
    }

    state
        .account
        .delete_account()
        .await
        .context("Account deletion failed")?;
    log_info("auth", "account deleted");
    println!("Account deleted.");
    Ok(())
}

pub async fn avatars(state: &AppState) -> Result<()> {
    let avatars = state
        .refresh_inbox()
        .await
        .context("Could not load connected avatars")?;

    if avatars.is_empty() {
        println!("No avatars connected. Use `hamo connect <code>` to add one.");
        return Ok(());
    }
    println!("Connected avatars:");
    for avatar in &avatars {
        print_avatar(avatar);
    }
    Ok(())
}

pub async fn connect(state: &AppState, code: &str) -> Result<()> {
    let avatars = state
        .account
        .connect_with_avatar(code)
        .await
        .context("Avatar connection failed")?;

    for avatar in &avatars {
        println!("Connected with {}", avatar.name.green());
    }
    state.add_avatars(avatars).await;
    Ok(())
}

pub async fn validate(state: &AppState, code: &str) -> Result<()> {
    let invitation = state
        .account
        .validate_invitation_code(code)
        .await
        .context("Invitation check failed")?;

    if !invitation.valid {
        println!("{}", "Invitation code is not valid.".red());
        return Ok(());
    }
    match invitation.pro_avatar {
        Some(avatar) => println!("Valid invitation from {}", avatar.name.green()),
        None => println!("Valid invitation."),
    }
    Ok(())
}

pub async fn history(state: &AppState, avatar_id: &str) -> Result<()> {
    let client_id = state.client_id()?;
    let session = state
        .sessions
        .open_session(&client_id, avatar_id)
        .await
        .context("Could not open a session with this avatar")?;

    let transcript = session.transcript();
    if transcript.is_empty() {
        println!("No messages yet.");
    }
    for message in &transcript {
        print_message(message, avatar_id);
    }

    // Nothing was sent; the backend session is not needed any more
    if let Err(e) = session.end().await {
        log_debug(format!("ending history session failed: {}", e));
    }
    Ok(())
}
