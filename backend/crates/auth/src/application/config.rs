//! Application Configuration
//!
//! Read once at startup and shared as `Arc<AuthConfig>`; never mutated
//! afterwards.

use std::fmt;
use std::time::Duration;

use platform::cookie::CookieConfig;
use platform::crypto::random_token_hex;
use platform::password::HashCost;
use thiserror::Error;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// Minimum signing secret length in bytes
pub const MIN_SECRET_LENGTH: usize = 32;

/// Upper bound for every configured token lifetime
pub const MAX_TTL: Duration = Duration::from_secs(365 * 86_400);

pub const DEFAULT_ISSUER: &str = "hrms-api";
pub const DEFAULT_AUDIENCE: &str = "hrms-client";
pub const REFRESH_COOKIE_NAME: &str = "refreshToken";
pub const REFRESH_COOKIE_PATH: &str = "/api/auth";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("{name} must be at least {min} bytes")]
    SecretTooShort { name: &'static str, min: usize },

    #[error("JWT_ACCESS_SECRET and JWT_REFRESH_SECRET must differ")]
    SecretsNotDistinct,

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone)]
pub struct AuthConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub issuer: String,
    pub audience: String,
    /// Shared secret required to create the first admin
    pub bootstrap_secret: String,
    pub invite_ttl: Duration,
    pub reset_ttl: Duration,
    /// Base for invite and reset links handed back to callers
    pub frontend_url: String,
    pub refresh_cookie_name: String,
    pub cookie_secure: bool,
    pub cookie_same_site: SameSite,
    pub password_pepper: Option<Vec<u8>>,
    pub hash_cost: HashCost,
    /// Development only: echo the reset link in the forgot-password response
    pub deliver_reset_links_in_response: bool,
}

impl AuthConfig {
    /// Random secrets, cheap hashing, insecure cookie. Local runs and tests.
    pub fn development() -> Self {
        Self {
            access_secret: random_token_hex(MIN_SECRET_LENGTH),
            refresh_secret: random_token_hex(MIN_SECRET_LENGTH),
            access_ttl: Duration::from_secs(15 * 60),
            refresh_ttl: Duration::from_secs(7 * 24 * 3600),
            issuer: DEFAULT_ISSUER.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
            bootstrap_secret: random_token_hex(16),
            invite_ttl: Duration::from_secs(48 * 3600),
            reset_ttl: Duration::from_secs(60 * 60),
            frontend_url: "http://localhost:3000".to_string(),
            refresh_cookie_name: REFRESH_COOKIE_NAME.to_string(),
            cookie_secure: false,
            cookie_same_site: SameSite::Strict,
            password_pepper: None,
            hash_cost: HashCost::minimal(),
            deliver_reset_links_in_response: true,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (the process environment in production)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let access_secret = required_secret(&get, "JWT_ACCESS_SECRET")?;
        let refresh_secret = required_secret(&get, "JWT_REFRESH_SECRET")?;
        if access_secret == refresh_secret {
            return Err(ConfigError::SecretsNotDistinct);
        }

        let bootstrap_secret =
            get("ADMIN_BOOTSTRAP_SECRET").ok_or(ConfigError::Missing("ADMIN_BOOTSTRAP_SECRET"))?;

        let access_ttl = duration_var(&get, "JWT_ACCESS_EXPIRES_IN", "15m")?;
        let refresh_ttl = duration_var(&get, "JWT_REFRESH_EXPIRES_IN", "7d")?;

        let invite_ttl = scaled_ttl_var(&get, "INVITE_TOKEN_TTL_HOURS", 48, 3600)?;
        let reset_ttl = scaled_ttl_var(&get, "PASSWORD_RESET_TTL_MINUTES", 60, 60)?;

        let production = get("APP_ENV").is_some_and(|v| v.eq_ignore_ascii_case("production"));
        let development = get("APP_ENV").is_some_and(|v| v.eq_ignore_ascii_case("development"));
        let cookie_secure = production || bool_var(&get, "COOKIE_SECURE", true)?;

        Ok(Self {
            access_secret,
            refresh_secret,
            access_ttl,
            refresh_ttl,
            issuer: get("JWT_ISSUER").unwrap_or_else(|| DEFAULT_ISSUER.to_string()),
            audience: get("JWT_AUDIENCE").unwrap_or_else(|| DEFAULT_AUDIENCE.to_string()),
            bootstrap_secret,
            invite_ttl,
            reset_ttl,
            frontend_url: get("FRONTEND_URL")
                .unwrap_or_else(|| "http://localhost:3000".to_string())
                .trim_end_matches('/')
                .to_string(),
            refresh_cookie_name: REFRESH_COOKIE_NAME.to_string(),
            cookie_secure,
            cookie_same_site: SameSite::Strict,
            password_pepper: get("PASSWORD_PEPPER").map(String::into_bytes),
            hash_cost: HashCost::default(),
            deliver_reset_links_in_response: development,
        })
    }

    /// Attributes of the refresh-token cookie
    pub fn refresh_cookie(&self) -> CookieConfig {
        CookieConfig {
            name: self.refresh_cookie_name.clone(),
            secure: self.cookie_secure,
            http_only: true,
            same_site: self.cookie_same_site,
            path: REFRESH_COOKIE_PATH.to_string(),
            max_age_secs: Some(self.refresh_ttl.as_secs() as i64),
        }
    }

    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_secret", &"[REDACTED]")
            .field("refresh_secret", &"[REDACTED]")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("bootstrap_secret", &"[REDACTED]")
            .field("invite_ttl", &self.invite_ttl)
            .field("reset_ttl", &self.reset_ttl)
            .field("frontend_url", &self.frontend_url)
            .field("cookie_secure", &self.cookie_secure)
            .field("password_pepper", &self.password_pepper.as_ref().map(|_| "[REDACTED]"))
            .field("hash_cost", &self.hash_cost)
            .finish()
    }
}

/// Parse `30s`, `15m`, `12h`, `7d`. A bare number is seconds.
pub fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);
    let number: u64 = number.parse().ok()?;

    let multiplier = match unit {
        "" | "s" => 1,
        "m" => 60,
        "h" => 3600,
        "d" => 86_400,
        _ => return None,
    };

    number.checked_mul(multiplier).map(Duration::from_secs)
}

fn required_secret<G>(get: &G, name: &'static str) -> Result<String, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let secret = get(name).ok_or(ConfigError::Missing(name))?;
    if secret.len() < MIN_SECRET_LENGTH {
        return Err(ConfigError::SecretTooShort {
            name,
            min: MIN_SECRET_LENGTH,
        });
    }
    Ok(secret)
}

fn duration_var<G>(get: &G, name: &'static str, default: &str) -> Result<Duration, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let raw = get(name).unwrap_or_else(|| default.to_string());
    parse_duration(&raw)
        .filter(|d| !d.is_zero() && *d <= MAX_TTL)
        .ok_or(ConfigError::Invalid { name, value: raw })
}

/// A positive count of `unit_secs`-long units, at most [`MAX_TTL`] in total
fn scaled_ttl_var<G>(
    get: &G,
    name: &'static str,
    default: u64,
    unit_secs: u64,
) -> Result<Duration, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let raw = get(name).unwrap_or_else(|| default.to_string());
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|n| *n > 0)
        .and_then(|n| n.checked_mul(unit_secs))
        .map(Duration::from_secs)
        .filter(|d| *d <= MAX_TTL)
        .ok_or(ConfigError::Invalid { name, value: raw })
}

fn bool_var<G>(get: &G, name: &'static str, default: bool) -> Result<bool, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(name).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) if matches!(v.as_str(), "true" | "1" | "yes") => Ok(true),
        Some(v) if matches!(v.as_str(), "false" | "0" | "no") => Ok(false),
        Some(value) => Err(ConfigError::Invalid { name, value }),
    }
}
