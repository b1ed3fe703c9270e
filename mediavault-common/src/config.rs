//! Static configuration loading and root folder resolution
//!
//! Static configuration covers everything the process must know before the
//! database is open: where the vault root lives, the token signing secret,
//! the built-in admin PIN, and SMTP fallbacks used when the system settings
//! row does not define a mail host.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::warn;

/// Default admin PIN used when none is configured. Matching it triggers a
/// startup warning; deployments are expected to override it.
pub const DEFAULT_ACCESS_PIN: &str = "12345678";

/// Default token signing secret. Same deal: works, but warns.
pub const DEFAULT_SECRET_KEY: &str = "changethis";

/// Default token lifetime: 8 days.
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 60 * 24 * 8;

/// Static process configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Vault root; the database and the static/upload tree live under it.
    pub root_folder: PathBuf,
    /// HMAC secret for access tokens.
    pub secret_key: String,
    /// Built-in admin PIN (a non-empty settings override shadows it).
    pub access_pin: String,
    /// Access token lifetime in minutes.
    pub token_ttl_minutes: i64,
    /// SMTP parameters used when system settings define no mail host.
    pub smtp: SmtpFallback,
}

/// Environment-sourced SMTP fallback block.
#[derive(Debug, Clone, Default)]
pub struct SmtpFallback {
    pub host: Option<String>,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub tls: bool,
    pub sender_email: Option<String>,
    pub sender_name: String,
}

/// Optional TOML config file contents.
#[derive(Debug, Clone, Default, Deserialize)]
struct FileConfig {
    root_folder: Option<String>,
    secret_key: Option<String>,
    access_pin: Option<String>,
    token_ttl_minutes: Option<i64>,
}

impl AppConfig {
    /// Load configuration with the standard priority order per value:
    /// 1. Command-line argument (root folder only, highest priority)
    /// 2. Environment variable
    /// 3. TOML config file
    /// 4. Compiled default (fallback)
    pub fn load(cli_root: Option<&str>) -> Result<AppConfig> {
        let file = read_config_file();

        let root_folder = resolve_root_folder(cli_root, "MEDIAVAULT_ROOT_FOLDER", &file)?;

        let secret_key = std::env::var("MEDIAVAULT_SECRET_KEY")
            .ok()
            .or_else(|| file.secret_key.clone())
            .unwrap_or_else(|| DEFAULT_SECRET_KEY.to_string());
        if secret_key == DEFAULT_SECRET_KEY {
            warn!("Token secret is the compiled default; set MEDIAVAULT_SECRET_KEY");
        }

        let access_pin = std::env::var("MEDIAVAULT_ACCESS_PIN")
            .ok()
            .or_else(|| file.access_pin.clone())
            .unwrap_or_else(|| DEFAULT_ACCESS_PIN.to_string());
        if access_pin == DEFAULT_ACCESS_PIN {
            warn!("Admin PIN is the compiled default; set MEDIAVAULT_ACCESS_PIN");
        }

        let token_ttl_minutes = std::env::var("MEDIAVAULT_TOKEN_TTL_MINUTES")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .or(file.token_ttl_minutes)
            .unwrap_or(DEFAULT_TOKEN_TTL_MINUTES);
        if token_ttl_minutes <= 0 {
            return Err(Error::Config(format!(
                "token_ttl_minutes must be positive, got {}",
                token_ttl_minutes
            )));
        }

        Ok(AppConfig {
            root_folder,
            secret_key,
            access_pin,
            token_ttl_minutes,
            smtp: SmtpFallback::from_env(),
        })
    }

    /// Path of the SQLite database file inside the vault root.
    pub fn db_path(&self) -> PathBuf {
        self.root_folder.join("mediavault.db")
    }

    /// Directory served at the static mount.
    pub fn static_dir(&self) -> PathBuf {
        self.root_folder.join("static")
    }

    /// Directory holding uploaded media blobs.
    pub fn upload_dir(&self) -> PathBuf {
        self.static_dir().join("uploads")
    }
}

impl SmtpFallback {
    /// Read the SMTP block from the environment. Absent host means email is
    /// mocked (logged) unless the settings row defines one.
    pub fn from_env() -> SmtpFallback {
        SmtpFallback {
            host: std::env::var("SMTP_HOST").ok().filter(|s| !s.is_empty()),
            port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(587),
            user: std::env::var("SMTP_USER").ok().filter(|s| !s.is_empty()),
            password: std::env::var("SMTP_PASSWORD").ok().filter(|s| !s.is_empty()),
            tls: std::env::var("SMTP_TLS")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true),
            sender_email: std::env::var("EMAILS_FROM_EMAIL")
                .ok()
                .filter(|s| !s.is_empty()),
            sender_name: std::env::var("EMAILS_FROM_NAME")
                .unwrap_or_else(|_| "MediaVault".to_string()),
        }
    }
}

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
fn resolve_root_folder(
    cli_arg: Option<&str>,
    env_var_name: &str,
    file: &FileConfig,
) -> Result<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Ok(PathBuf::from(path));
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        return Ok(PathBuf::from(path));
    }

    // Priority 3: TOML config file
    if let Some(root_folder) = &file.root_folder {
        return Ok(PathBuf::from(root_folder));
    }

    // Priority 4: OS-dependent compiled default
    Ok(get_default_root_folder())
}

/// Parse the platform config file if one exists; missing or malformed files
/// resolve to the empty config rather than an error.
fn read_config_file() -> FileConfig {
    let Ok(path) = locate_config_file() else {
        return FileConfig::default();
    };
    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str::<FileConfig>(&content) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("Ignoring malformed config file {}: {}", path.display(), e);
                FileConfig::default()
            }
        },
        Err(_) => FileConfig::default(),
    }
}

/// Get default configuration file path for the platform
fn locate_config_file() -> Result<PathBuf> {
    let config_path = if cfg!(target_os = "linux") {
        // Try ~/.config/mediavault/config.toml first, then /etc/mediavault/config.toml
        let user_config = dirs::config_dir().map(|d| d.join("mediavault").join("config.toml"));
        let system_config = PathBuf::from("/etc/mediavault/config.toml");

        if let Some(path) = user_config {
            if path.exists() {
                return Ok(path);
            }
        }
        if system_config.exists() {
            return Ok(system_config);
        }
        return Err(Error::Config("No config file found".to_string()));
    } else {
        dirs::config_dir()
            .map(|d| d.join("mediavault").join("config.toml"))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?
    };

    if config_path.exists() {
        Ok(config_path)
    } else {
        Err(Error::Config(format!(
            "Config file not found: {:?}",
            config_path
        )))
    }
}

/// Get OS-dependent default root folder path
fn get_default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/mediavault (or /var/lib/mediavault for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("mediavault"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/mediavault"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("mediavault"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/mediavault"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("mediavault"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\mediavault"))
    } else {
        PathBuf::from("./mediavault_data")
    }
}
