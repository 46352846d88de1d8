use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use std::env;
use std::path::PathBuf;

pub mod models;
pub use models::*;

/// Loads the unified application configuration.
///
/// Sources, later ones overriding earlier ones:
/// 1. `config/default.*` at the workspace root
/// 2. `config/<RUN_ENV>.*` (RUN_ENV defaults to "debug")
/// 3. Environment variables with the `DIMPLE` prefix and `__` separator
///    (e.g. `DIMPLE_SERVER__PORT=8086`)
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "debug".to_string());
    let prefix = env::var("PREFIX").unwrap_or_else(|_| "DIMPLE".to_string());

    let root = config_root();
    let default_path = root.join("config/default");
    let env_path = root.join(format!("config/{}", run_env));

    let builder = Config::builder()
        .add_source(File::with_name(default_path.to_string_lossy().as_ref()).required(false))
        .add_source(File::with_name(env_path.to_string_lossy().as_ref()).required(false))
        .add_source(Environment::with_prefix(&prefix).separator("__"));

    let raw_config: AppConfig = builder.build()?.try_deserialize()?;
    Ok(raw_config)
}

/// Resolves the directory the `config/` folder lives under.
///
/// When built inside the workspace this walks up from the crate manifest to
/// the workspace root; for installed binaries it falls back to the current
/// working directory.
fn config_root() -> PathBuf {
    if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
        let manifest_dir = PathBuf::from(manifest_dir);
        // go from crates/dimple_config (or crates/services/<bin>) to workspace root
        for ancestor in manifest_dir.ancestors() {
            if ancestor.join("config").is_dir() {
                return ancestor.to_path_buf();
            }
        }
    }
    env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Ensures that the dotenv file is loaded into the environment variables.
///
/// The path can be overridden with `DOTENV_OVERRIDE`; otherwise `.env` is
/// used. Loading happens at most once per process.
pub fn ensure_dotenv_loaded() -> String {
    let dotenv_path = env::var("DOTENV_OVERRIDE").unwrap_or_else(|_| ".env".to_string());

    INIT_DOTENV.get_or_init(|| {
        dotenv::from_filename(&dotenv_path).ok();
    });

    dotenv_path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_defaults_match_business_rules() {
        let booking = BookingConfig::default();
        assert_eq!(booking.min_duration_minutes, 30);
        assert_eq!(booking.max_duration_minutes, 240);
        assert_eq!(booking.max_cancellation_reason_chars, 300);
    }

    #[test]
    fn app_config_deserializes_with_minimal_sections() {
        let cfg: AppConfig = serde_json::from_str(
            r#"{ "server": { "host": "127.0.0.1", "port": 8086 } }"#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 8086);
        assert!(!cfg.use_telebirr);
        assert!(cfg.database.is_none());
        assert_eq!(cfg.booking.max_duration_minutes, 240);
    }
}
