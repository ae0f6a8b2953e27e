// ABOUTME: Resolves the effective client configuration from flags and environment
// ABOUTME: Non-empty flags override SMPP_USER / SMPP_PASSWD; the address is flag-or-default only

use crate::cli::args::CliArgs;
use std::fmt;

/// SMSC address used when `--addr` is not given.
pub const DEFAULT_ADDR: &str = "localhost:6200";

pub const USER_ENV: &str = "SMPP_USER";
pub const PASSWD_ENV: &str = "SMPP_PASSWD";

/// Effective settings for one client run. Built once, never mutated.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfiguration {
    pub addr: String,
    pub user: String,
    pub passwd: String,
    pub tls: bool,
    pub precaire: bool,
}

impl ClientConfiguration {
    /// Merges `args` with the environment seen through `env`.
    ///
    /// Missing credentials resolve to empty strings; the SMSC rejecting the
    /// bind is how their absence surfaces.
    pub fn resolve<F>(args: &CliArgs, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let addr = args
            .addr
            .clone()
            .unwrap_or_else(|| DEFAULT_ADDR.to_string());

        Self {
            addr,
            user: pick(args.user.as_deref(), env(USER_ENV)),
            passwd: pick(args.passwd.as_deref(), env(PASSWD_ENV)),
            tls: args.tls,
            precaire: args.precaire,
        }
    }

    /// `resolve` against the process environment.
    pub fn from_env(args: &CliArgs) -> Self {
        Self::resolve(args, |key| std::env::var(key).ok())
    }
}

fn pick(flag: Option<&str>, env: Option<String>) -> String {
    match flag {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => env.unwrap_or_default(),
    }
}

impl fmt::Debug for ClientConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfiguration")
            .field("addr", &self.addr)
            .field("user", &self.user)
            .field("passwd", &"<redacted>")
            .field("tls", &self.tls)
            .field("precaire", &self.precaire)
            .finish()
    }
}
