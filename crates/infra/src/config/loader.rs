//! Configuration loader
//!
//! Resolves the [`FaxConfig`] with per-field precedence: environment
//! variable, then config file, then the built-in default.
//!
//! ## Environment Variables
//! Every config field has a `FAXGATE_*` override, for example:
//! - `FAXGATE_ENABLED`: module master switch (true/false)
//! - `FAXGATE_PROJECT_ID`: provider project ID
//! - `FAXGATE_AUTH_METHOD`: `basic` or `oauth`
//! - `FAXGATE_API_KEY` / `FAXGATE_API_SECRET`: Basic credentials
//! - `FAXGATE_REGION`: provider region (`global`, `use1`, `eu1`, ...)
//! - `FAXGATE_DATABASE_PATH`: SQLCipher database file
//!
//! Secret-bearing values (`api_secret`, `oauth_token`, `webhook_secret`) may
//! be supplied as `enc:<base64 envelope>`; they are decrypted with the key
//! derived from `FAXGATE_CONFIG_KEY`.
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./faxgate.json` or `./faxgate.toml` (current working directory)
//! 3. Parent directories (up to 2 levels)
//! 4. Relative to executable location

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use faxgate_common::{EncryptedData, EncryptionService};
use faxgate_domain::{FaxConfig, FaxError, Result};

/// Marker prefix for secrets stored as encrypted envelopes.
const ENCRYPTED_PREFIX: &str = "enc:";
/// Environment variable holding the passphrase for encrypted secrets.
const CONFIG_KEY_VAR: &str = "FAXGATE_CONFIG_KEY";

/// Load the module configuration.
///
/// Starts from a probed config file (or defaults when none exists), applies
/// `FAXGATE_*` environment overrides, resolves storage-path fallbacks, and
/// decrypts any `enc:`-wrapped secrets.
///
/// # Errors
/// Returns `FaxError::Config` if:
/// - A config file exists but cannot be read or parsed
/// - An environment override has an invalid value
/// - Encrypted secrets are present but cannot be decrypted
pub fn load() -> Result<FaxConfig> {
    let mut config = match probe_config_paths() {
        Some(path) => load_from_file(Some(path))?,
        None => {
            tracing::debug!("no config file found; starting from defaults");
            FaxConfig::default()
        }
    };

    apply_env_overrides(&mut config)?;
    apply_storage_defaults(&mut config);
    decrypt_secrets(&mut config)?;

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
/// Missing fields take their defaults; no environment overrides or secret
/// decryption are applied here.
///
/// # Errors
/// Returns `FaxError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<FaxConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(FaxError::Config(format!("config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            FaxError::Config("no config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "loading fax configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| FaxError::Config(format!("failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content; format detected by extension.
fn parse_config(contents: &str, path: &Path) -> Result<FaxConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| FaxError::Config(format!("invalid TOML config: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| FaxError::Config(format!("invalid JSON config: {e}"))),
        _ => Err(FaxError::Config(format!("unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches the current working directory, up to two parent levels, and the
/// executable's directory for `config.{json,toml}` and `faxgate.{json,toml}`.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    // Try current working directory
    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(vec![
            cwd.join("config.json"),
            cwd.join("config.toml"),
            cwd.join("faxgate.json"),
            cwd.join("faxgate.toml"),
            cwd.join("../config.json"),
            cwd.join("../config.toml"),
            cwd.join("../../config.json"),
            cwd.join("../../config.toml"),
        ]);
    }

    // Try relative to executable
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(vec![
                exe_dir.join("config.json"),
                exe_dir.join("config.toml"),
                exe_dir.join("faxgate.json"),
                exe_dir.join("faxgate.toml"),
            ]);
        }
    }

    // Return first existing candidate
    candidates.into_iter().find(|path| path.exists())
}

/// Apply `FAXGATE_*` environment overrides onto the base configuration.
fn apply_env_overrides(config: &mut FaxConfig) -> Result<()> {
    if let Some(value) = env_bool("FAXGATE_ENABLED") {
        config.enabled = value;
    }
    if let Some(value) = env_var("FAXGATE_PROJECT_ID") {
        config.project_id = value;
    }
    if let Some(value) = env_var("FAXGATE_SERVICE_ID") {
        config.service_id = value;
    }
    if let Some(value) = env_parse("FAXGATE_AUTH_METHOD")? {
        config.auth_method = value;
    }
    if let Some(value) = env_var("FAXGATE_API_KEY") {
        config.api_key = value;
    }
    if let Some(value) = env_var("FAXGATE_API_SECRET") {
        config.api_secret = value;
    }
    if let Some(value) = env_var("FAXGATE_OAUTH_TOKEN") {
        config.oauth_token = value;
    }
    if let Some(value) = env_parse("FAXGATE_REGION")? {
        config.region = value;
    }
    if let Some(value) = env_var("FAXGATE_WEBHOOK_SECRET") {
        config.webhook_secret = value;
    }
    if let Some(value) = env_var("FAXGATE_FILE_STORAGE_PATH") {
        config.file_storage_path = value;
    }
    if let Some(value) = env_bool("FAXGATE_AUTO_RECEIVE") {
        config.auto_receive = value;
    }
    if let Some(value) = env_parse("FAXGATE_DEFAULT_RETRY_COUNT")? {
        config.default_retry_count = value;
    }
    if let Some(value) = env_bool("FAXGATE_ENABLE_STATUS_POLLING") {
        config.enable_status_polling = value;
    }
    if let Some(value) = env_bool("FAXGATE_ENABLE_WEBHOOKS") {
        config.enable_webhooks = value;
    }
    if let Some(value) = env_bool("FAXGATE_ENABLE_INCOMING_POLLING") {
        config.enable_incoming_polling = value;
    }
    if let Some(value) = env_var("FAXGATE_SITE_ADDRESS") {
        config.site_address = value;
    }
    if let Some(value) = env_var("FAXGATE_WEBHOOK_BIND_ADDR") {
        config.webhook_bind_addr = value;
    }
    if let Some(value) = env_parse("FAXGATE_POLL_INTERVAL_SECS")? {
        config.poll_interval_secs = value;
    }
    if let Some(value) = env_var("FAXGATE_DATABASE_PATH") {
        config.database_path = value;
    }
    if let Some(value) = env_parse("FAXGATE_DATABASE_POOL_SIZE")? {
        config.database_pool_size = value;
    }
    Ok(())
}

/// Fill storage paths that neither the file nor the environment supplied.
fn apply_storage_defaults(config: &mut FaxConfig) {
    if config.file_storage_path.is_empty() {
        config.file_storage_path = default_data_path("documents");
    }
    if config.database_path.is_empty() {
        config.database_path = default_data_path("faxgate.db");
    }
}

fn default_data_path(leaf: &str) -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("faxgate")
        .join(leaf)
        .to_string_lossy()
        .into_owned()
}

/// Decrypt `enc:`-wrapped secret fields in place.
///
/// The passphrase comes from `FAXGATE_CONFIG_KEY`; the Argon2 salt travels
/// inside each envelope. Plaintext values pass through untouched.
fn decrypt_secrets(config: &mut FaxConfig) -> Result<()> {
    let has_encrypted = [&config.api_secret, &config.oauth_token, &config.webhook_secret]
        .iter()
        .any(|value| value.starts_with(ENCRYPTED_PREFIX));
    if !has_encrypted {
        return Ok(());
    }

    let passphrase = std::env::var(CONFIG_KEY_VAR).map_err(|_| {
        FaxError::Config(format!("encrypted secrets present but {CONFIG_KEY_VAR} is not set"))
    })?;

    config.api_secret = decrypt_secret(&config.api_secret, &passphrase)?;
    config.oauth_token = decrypt_secret(&config.oauth_token, &passphrase)?;
    config.webhook_secret = decrypt_secret(&config.webhook_secret, &passphrase)?;
    Ok(())
}

fn decrypt_secret(value: &str, passphrase: &str) -> Result<String> {
    let Some(envelope_b64) = value.strip_prefix(ENCRYPTED_PREFIX) else {
        return Ok(value.to_string());
    };

    let decoded = BASE64
        .decode(envelope_b64)
        .map_err(|e| FaxError::Config(format!("invalid encrypted secret envelope: {e}")))?;
    let envelope: EncryptedData = serde_json::from_slice(&decoded)
        .map_err(|e| FaxError::Config(format!("invalid encrypted secret envelope: {e}")))?;
    let Some(salt) = envelope.salt.as_deref() else {
        return Err(FaxError::Config(
            "encrypted secret envelope is missing its key salt".to_string(),
        ));
    };

    let service = EncryptionService::from_password_with_salt(passphrase, Some(salt))
        .map_err(|e| FaxError::Config(format!("cannot derive config key: {e}")))?;
    let plaintext = service
        .decrypt(&envelope)
        .map_err(|e| FaxError::Config(format!("cannot decrypt config secret: {e}")))?;

    String::from_utf8(plaintext)
        .map_err(|_| FaxError::Config("decrypted config secret is not valid UTF-8".to_string()))
}

/// Get optional environment variable, treating empty values as unset.
fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str) -> Option<bool> {
    env_var(key).map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

/// Parse a typed value from an environment variable.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env_var(key) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| FaxError::Config(format!("invalid value for {key}: {e}"))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use faxgate_domain::{AuthMethod, Region};
    use once_cell::sync::Lazy;
    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    fn clear_faxgate_env() {
        for (key, _) in std::env::vars() {
            if key.starts_with("FAXGATE_") {
                std::env::remove_var(key);
            }
        }
    }

    #[test]
    fn env_bool_accepts_the_usual_spellings() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        for (value, expected) in
            [("1", true), ("true", true), ("YES", true), ("on", true), ("0", false), ("no", false)]
        {
            std::env::set_var("TEST_FAX_BOOL", value);
            assert_eq!(env_bool("TEST_FAX_BOOL"), Some(expected), "value {value:?}");
        }

        std::env::remove_var("TEST_FAX_BOOL");
        assert_eq!(env_bool("TEST_FAX_BOOL"), None);
    }

    #[test]
    fn env_overrides_take_precedence_over_defaults() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_faxgate_env();

        std::env::set_var("FAXGATE_ENABLED", "true");
        std::env::set_var("FAXGATE_PROJECT_ID", "proj-env");
        std::env::set_var("FAXGATE_AUTH_METHOD", "oauth");
        std::env::set_var("FAXGATE_OAUTH_TOKEN", "tok-env");
        std::env::set_var("FAXGATE_REGION", "eu1");
        std::env::set_var("FAXGATE_POLL_INTERVAL_SECS", "120");

        let mut config = FaxConfig::default();
        apply_env_overrides(&mut config).expect("overrides apply");

        assert!(config.enabled);
        assert_eq!(config.project_id, "proj-env");
        assert_eq!(config.auth_method, AuthMethod::Oauth);
        assert_eq!(config.oauth_token, "tok-env");
        assert_eq!(config.region, Region::Eu1);
        assert_eq!(config.poll_interval_secs, 120);
        // Untouched fields keep their defaults.
        assert!(config.enable_webhooks);
        assert_eq!(config.webhook_bind_addr, "127.0.0.1:8090");

        clear_faxgate_env();
    }

    #[test]
    fn invalid_env_numbers_are_config_errors() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_faxgate_env();

        std::env::set_var("FAXGATE_POLL_INTERVAL_SECS", "not-a-number");

        let mut config = FaxConfig::default();
        let err = apply_env_overrides(&mut config).expect_err("invalid number rejected");
        assert!(matches!(err, FaxError::Config(_)));

        clear_faxgate_env();
    }

    #[test]
    fn partial_toml_files_keep_defaults_for_missing_fields() {
        let toml_content = r#"
enabled = true
project_id = "proj-file"
api_key = "key-file"
api_secret = "secret-file"
region = "use1"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        let path = temp_file.path().with_extension("toml");
        std::fs::copy(temp_file.path(), &path).unwrap();

        let config = load_from_file(Some(path.clone())).expect("toml loads");
        assert!(config.enabled);
        assert_eq!(config.project_id, "proj-file");
        assert_eq!(config.region, Region::Use1);
        assert_eq!(config.default_retry_count, 3);
        assert_eq!(config.database_pool_size, 8);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn json_files_load_by_extension() {
        let json_content = r#"{
            "enabled": true,
            "project_id": "proj-json",
            "auth_method": "oauth",
            "oauth_token": "tok-json"
        }"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(json_content.as_bytes()).unwrap();
        let path = temp_file.path().with_extension("json");
        std::fs::copy(temp_file.path(), &path).unwrap();

        let config = load_from_file(Some(path.clone())).expect("json loads");
        assert_eq!(config.project_id, "proj-json");
        assert_eq!(config.auth_method, AuthMethod::Oauth);
        assert!(config.is_configured());

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn missing_explicit_file_is_a_config_error() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/faxgate.toml")));
        assert!(matches!(result, Err(FaxError::Config(_))));
    }

    #[test]
    fn unsupported_extensions_are_rejected() {
        let result = parse_config("enabled = true", &PathBuf::from("faxgate.yaml"));
        assert!(matches!(result, Err(FaxError::Config(_))));
    }

    #[test]
    fn encrypted_secrets_decrypt_with_the_config_key() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_faxgate_env();

        let service = EncryptionService::from_password("deploy-passphrase").unwrap();
        let envelope = service.encrypt_to_string(b"plain-api-secret").unwrap();

        std::env::set_var("FAXGATE_CONFIG_KEY", "deploy-passphrase");

        let mut config = FaxConfig::default();
        config.api_secret = format!("enc:{envelope}");
        config.oauth_token = "already-plain".to_string();

        decrypt_secrets(&mut config).expect("decryption succeeds");
        assert_eq!(config.api_secret, "plain-api-secret");
        assert_eq!(config.oauth_token, "already-plain");

        clear_faxgate_env();
    }

    #[test]
    fn encrypted_secrets_without_a_key_fail_loudly() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_faxgate_env();

        let mut config = FaxConfig::default();
        config.api_secret = "enc:AAAA".to_string();

        let err = decrypt_secrets(&mut config).expect_err("missing key rejected");
        assert!(err.to_string().contains("FAXGATE_CONFIG_KEY"), "{err}");

        clear_faxgate_env();
    }

    #[test]
    fn wrong_config_key_fails_to_decrypt() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_faxgate_env();

        let service = EncryptionService::from_password("right-key").unwrap();
        let envelope = service.encrypt_to_string(b"secret").unwrap();

        std::env::set_var("FAXGATE_CONFIG_KEY", "wrong-key");

        let mut config = FaxConfig::default();
        config.api_secret = format!("enc:{envelope}");

        let err = decrypt_secrets(&mut config).expect_err("wrong key rejected");
        assert!(matches!(err, FaxError::Config(_)));

        clear_faxgate_env();
    }

    #[test]
    fn storage_defaults_fill_only_empty_paths() {
        let mut config = FaxConfig::default();
        config.database_path = "/custom/faxgate.db".to_string();

        apply_storage_defaults(&mut config);
        assert_eq!(config.database_path, "/custom/faxgate.db");
        assert!(config.file_storage_path.ends_with("documents"));
        assert!(config.file_storage_path.contains("faxgate"));
    }
}
