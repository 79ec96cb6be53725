//! Implementations of the `authkeep` subcommands.

use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use authkeep_core::api::client::DEFAULT_BASE_URL;
use authkeep_core::{Config, FileStore, IdentityClient, Session, SessionManager};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::format::{format_instant, format_remaining};
use crate::navigator::TerminalNavigator;

// ============================================================================
// Environment overrides
// ============================================================================

const API_KEY_ENV: &str = "AUTHKEEP_API_KEY";
const BASE_URL_ENV: &str = "AUTHKEEP_BASE_URL";
const EMAIL_ENV: &str = "AUTHKEEP_EMAIL";
const PASSWORD_ENV: &str = "AUTHKEEP_PASSWORD";
const STORE_DIR_ENV: &str = "AUTHKEEP_STORE_DIR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthKind {
    Login,
    Signup,
}

pub struct Context {
    config: Config,
    manager: SessionManager,
    has_api_key: bool,
}

impl Context {
    /// Resolve configuration and build the session manager
    pub fn load() -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };

        let api_key = non_empty_env(API_KEY_ENV)
            .or_else(|| config.api_key.clone())
            .unwrap_or_default();
        let base_url = non_empty_env(BASE_URL_ENV)
            .or_else(|| config.identity_base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let store_dir = match env::var_os(STORE_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => config
                .store_dir()
                .unwrap_or_else(|_| PathBuf::from("./authkeep-data")),
        };
        debug!(%base_url, store_dir = %store_dir.display(), "Configuration resolved");

        let has_api_key = !api_key.is_empty();
        let identity = IdentityClient::with_base_url(base_url, api_key)?;
        let manager = SessionManager::with_system_time(
            Arc::new(identity),
            Arc::new(FileStore::new(store_dir)),
            Arc::new(TerminalNavigator),
        );

        Ok(Self {
            config,
            manager,
            has_api_key,
        })
    }

    pub async fn authenticate(&mut self, kind: AuthKind, email: Option<String>) -> Result<()> {
        if !self.has_api_key {
            bail!(
                "No API key configured. Set {} or api_key in config.json",
                API_KEY_ENV
            );
        }

        let email = match email
            .or_else(|| non_empty_env(EMAIL_ENV))
            .or_else(|| self.config.last_email.clone())
        {
            Some(email) => email,
            None => prompt_email()?,
        };
        let password = match non_empty_env(PASSWORD_ENV) {
            Some(password) => password,
            None => rpassword::prompt_password("Password: ")?,
        };

        if email.is_empty() || password.is_empty() {
            bail!("Email and password required");
        }

        let session = match kind {
            AuthKind::Login => self.manager.login(&email, &password).await?,
            AuthKind::Signup => self.manager.signup(&email, &password).await?,
        };

        self.config.last_email = Some(email);
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }

        match kind {
            AuthKind::Login => println!("Signed in as {}", session.email),
            AuthKind::Signup => println!("Account created for {}", session.email),
        }
        print_expiry(&session);
        Ok(())
    }

    pub fn logout(&self) {
        self.manager.logout();
    }

    pub fn status(&self) {
        if !self.manager.restore_session() {
            println!("Not signed in.");
            return;
        }
        if let Some(session) = self.manager.current() {
            println!("Signed in as {}", session.email);
            println!("User ID:  {}", session.user_id);
            print_expiry(&session);
        }
    }

    /// Print the bearer token of a live session, for use in scripts
    pub fn token(&self) -> Result<()> {
        self.manager.restore_session();
        match self.manager.token() {
            Some(token) => {
                println!("{}", token);
                Ok(())
            }
            None => bail!("No active session"),
        }
    }

    /// Follow the session until it ends or the user interrupts
    pub async fn watch(&self) -> Result<()> {
        if !self.manager.restore_session() {
            println!("Not signed in.");
            return Ok(());
        }

        let mut rx = self.manager.subscribe();
        let current = rx.borrow_and_update().clone();
        if let Some(session) = current {
            println!("Watching session for {} (Ctrl-C to stop)", session.email);
            print_expiry(&session);
        }

        loop {
            tokio::select! {
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let current = rx.borrow_and_update().clone();
                    match current {
                        Some(session) => {
                            info!(email = %session.email, "Session changed");
                            print_expiry(&session);
                        }
                        None => {
                            println!("Session ended.");
                            break;
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    println!();
                    break;
                }
            }
        }
        Ok(())
    }
}

fn print_expiry(session: &Session) {
    let remaining = session.time_until_expiry(Utc::now());
    println!(
        "Expires:  {} ({})",
        format_instant(session.expires_at),
        format_remaining(remaining)
    );
}

fn prompt_email() -> Result<String> {
    print!("Email: ");
    io::stdout().flush()?;

    let mut email = String::new();
    io::stdin().read_line(&mut email)?;
    Ok(email.trim().to_string())
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
