//! Construction parameters and the admin credential check.

use std::env;

use super::ConfigError;

/// Admin-supplied sizing, fixed for the lifetime of a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineConfig {
    /// Most units of any one product the machine can hold.
    pub max_capacity: u32,
    /// Starting stock of every product.
    pub product_level: u32,
    /// Starting stock of every coin type.
    pub coin_level: u32,
}

impl MachineConfig {
    pub fn new(max_capacity: u32, product_level: u32, coin_level: u32) -> Self {
        Self {
            max_capacity,
            product_level,
            coin_level,
        }
    }

    /// Build a config from textual input, e.g. command line arguments.
    pub fn parse(
        max_capacity: &str,
        product_level: &str,
        coin_level: &str,
    ) -> Result<Self, ConfigError> {
        let config = Self::new(
            parse_level("max capacity", max_capacity)?,
            parse_level("product level", product_level)?,
            parse_level("coin level", coin_level)?,
        );
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.product_level > self.max_capacity {
            return Err(ConfigError::ProductLevelExceedsCapacity(
                self.product_level,
                self.max_capacity,
            ));
        }
        Ok(())
    }
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self::new(20, 10, 10)
    }
}

fn parse_level(field: &'static str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        field,
        value: value.to_string(),
    })
}

/// Decides whether a login attempt may enter admin mode.
pub trait CredentialCheck {
    fn verify(&self, username: &str, password: &str) -> bool;
}

/// A single username/password pair.
#[derive(Clone)]
pub struct AdminCredentials {
    username: String,
    password: String,
}

impl AdminCredentials {
    pub const USER_VAR: &'static str = "VEND_ADMIN_USER";
    pub const PASSWORD_VAR: &'static str = "VEND_ADMIN_PASSWORD";

    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Read the pair from `VEND_ADMIN_USER` / `VEND_ADMIN_PASSWORD`.
    pub fn from_env() -> Option<Self> {
        let username = env::var(Self::USER_VAR).ok()?;
        let password = env::var(Self::PASSWORD_VAR).ok()?;
        if username.is_empty() {
            return None;
        }
        Some(Self::new(username, password))
    }
}

impl CredentialCheck for AdminCredentials {
    fn verify(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Refuses every login. Used when no credentials were configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct Locked;

impl CredentialCheck for Locked {
    fn verify(&self, _username: &str, _password: &str) -> bool {
        false
    }
}
