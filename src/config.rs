use clap::Parser;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

/// Configuration for the EnzoLearn server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// URL for the database connection
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Secret the session tokens are signed with; a random one is used when unset
    pub jwt_secret: Option<String>,
    /// Lifetime of session tokens in hours
    pub token_ttl_hours: i64,
    /// Origins allowed to call the API from a browser
    pub cors_origins: Vec<String>,
    /// Directory generated audio is written to
    pub media_dir: String,
    /// Public URL the media directory is reachable at
    pub public_base_url: String,
    pub llm_base_url: String,
    pub llm_api_key: Option<String>,
    pub llm_model: String,
    pub tts_base_url: String,
    pub tts_api_key: Option<String>,
    pub tts_voice_id: String,
    /// Most characters of user text sent to the language model
    pub max_input_chars: usize,
    /// Most characters sent to the speech synthesizer
    pub max_speech_chars: usize,
    /// Requests one client IP may make per window; 0 turns limiting off
    pub rate_limit_max: u32,
    pub rate_limit_window_secs: u64,
}

/// Longest session lifetime accepted from configuration (ten years)
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365 * 10;

/// Update structure for Config with all fields optional
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ConfigUpdate {
    pub database_url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub jwt_secret: Option<String>,
    pub token_ttl_hours: Option<i64>,
    pub cors_origins: Option<Vec<String>>,
    pub media_dir: Option<String>,
    pub public_base_url: Option<String>,
    pub llm_base_url: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_model: Option<String>,
    pub tts_base_url: Option<String>,
    pub tts_api_key: Option<String>,
    pub tts_voice_id: Option<String>,
    pub max_input_chars: Option<usize>,
    pub max_speech_chars: Option<usize>,
    pub rate_limit_max: Option<u32>,
    pub rate_limit_window_secs: Option<u64>,
    /// Server URL used by the command-line client; ignored by the server
    pub server_url: Option<String>,
}

/// Command line arguments for the server
#[derive(Parser, Debug, Default)]
#[clap(name = "enzolearn", about = "Study collections, flashcards and AI study tools over HTTP")]
pub struct CliArgs {
    /// Database URL
    #[clap(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Address to bind to
    #[clap(long, env = "HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[clap(long, env = "PORT")]
    pub port: Option<u16>,

    /// Secret for signing session tokens
    #[clap(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Session token lifetime in hours
    #[clap(long, env = "TOKEN_TTL_HOURS")]
    pub token_ttl_hours: Option<i64>,

    /// Comma-separated list of allowed CORS origins
    #[clap(long, env = "CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    /// Directory to store generated audio in
    #[clap(long, env = "MEDIA_DIR")]
    pub media_dir: Option<String>,

    /// Public URL prefix for stored media
    #[clap(long, env = "PUBLIC_BASE_URL")]
    pub public_base_url: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[clap(long, env = "LLM_BASE_URL")]
    pub llm_base_url: Option<String>,

    #[clap(long, env = "LLM_API_KEY", hide_env_values = true)]
    pub llm_api_key: Option<String>,

    #[clap(long, env = "LLM_MODEL")]
    pub llm_model: Option<String>,

    /// Base URL of the text-to-speech API
    #[clap(long, env = "TTS_BASE_URL")]
    pub tts_base_url: Option<String>,

    #[clap(long, env = "ELEVENLABS_API_KEY", hide_env_values = true)]
    pub tts_api_key: Option<String>,

    #[clap(long, env = "TTS_VOICE_ID")]
    pub tts_voice_id: Option<String>,

    /// Most characters of user text sent to the language model
    #[clap(long, env = "MAX_INPUT_CHARS")]
    pub max_input_chars: Option<usize>,

    /// Most characters sent to the speech synthesizer
    #[clap(long, env = "MAX_SPEECH_CHARS")]
    pub max_speech_chars: Option<usize>,

    /// Requests allowed per client IP in each window (0 disables limiting)
    #[clap(long, env = "RATE_LIMIT_MAX")]
    pub rate_limit_max: Option<u32>,

    /// Length of the rate limit window in seconds
    #[clap(long, env = "RATE_LIMIT_WINDOW_SECS")]
    pub rate_limit_window_secs: Option<u64>,

    /// Directory for daily-rolling log files; logs go to stdout only when unset
    #[clap(long, env = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Debug mode
    #[clap(long, env = "ENZOLEARN_DEBUG", default_value_t = false)]
    pub debug: bool,
}

impl Config {
    /// Applies a config update to the current configuration
    pub fn apply_update(self, update: ConfigUpdate) -> Self {
        Self {
            database_url: update.database_url.unwrap_or(self.database_url),
            host: update.host.unwrap_or(self.host),
            port: update.port.unwrap_or(self.port),
            jwt_secret: update.jwt_secret.or(self.jwt_secret),
            token_ttl_hours: update.token_ttl_hours.unwrap_or(self.token_ttl_hours),
            cors_origins: update.cors_origins.unwrap_or(self.cors_origins),
            media_dir: update.media_dir.unwrap_or(self.media_dir),
            public_base_url: update.public_base_url.unwrap_or(self.public_base_url),
            llm_base_url: update.llm_base_url.unwrap_or(self.llm_base_url),
            llm_api_key: update.llm_api_key.or(self.llm_api_key),
            llm_model: update.llm_model.unwrap_or(self.llm_model),
            tts_base_url: update.tts_base_url.unwrap_or(self.tts_base_url),
            tts_api_key: update.tts_api_key.or(self.tts_api_key),
            tts_voice_id: update.tts_voice_id.unwrap_or(self.tts_voice_id),
            max_input_chars: update.max_input_chars.unwrap_or(self.max_input_chars),
            max_speech_chars: update.max_speech_chars.unwrap_or(self.max_speech_chars),
            rate_limit_max: update.rate_limit_max.unwrap_or(self.rate_limit_max),
            rate_limit_window_secs: update.rate_limit_window_secs.unwrap_or(self.rate_limit_window_secs),
        }
    }

    /// The session token lifetime
    ///
    /// ### Errors
    ///
    /// Returns an error unless `token_ttl_hours` is between 1 and
    /// `MAX_TOKEN_TTL_HOURS`.
    pub fn token_ttl(&self) -> Result<chrono::Duration, String> {
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&self.token_ttl_hours) {
            return Err(format!(
                "token_ttl_hours must be between 1 and {}, got {}",
                MAX_TOKEN_TTL_HOURS, self.token_ttl_hours
            ));
        }
        chrono::Duration::try_hours(self.token_ttl_hours)
            .ok_or_else(|| format!("token_ttl_hours out of range: {}", self.token_ttl_hours))
    }

    /// The address the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Returns the base (default) configuration
///
/// The database and media directory live in the config directory when one
/// exists, otherwise next to the working directory.
pub fn base_config(config_path: Option<PathBuf>) -> Config {
    let in_config_dir = |name: &str| {
        config_path
            .as_ref()
            .map_or(name.to_string(), |path| path.join(name).to_string_lossy().to_string())
    };

    Config {
        database_url: in_config_dir("enzolearn.db"),
        host: "0.0.0.0".to_string(),
        port: 5000,
        jwt_secret: None,
        token_ttl_hours: 24 * 7,
        cors_origins: vec!["http://localhost:3000".to_string()],
        media_dir: in_config_dir("media"),
        public_base_url: "http://localhost:5000/media".to_string(),
        llm_base_url: crate::vendors::DEFAULT_LLM_URL.to_string(),
        llm_api_key: None,
        llm_model: crate::vendors::DEFAULT_LLM_MODEL.to_string(),
        tts_base_url: crate::vendors::DEFAULT_TTS_URL.to_string(),
        tts_api_key: None,
        tts_voice_id: crate::vendors::DEFAULT_VOICE_ID.to_string(),
        max_input_chars: 12_000,
        max_speech_chars: 5_000,
        rate_limit_max: 100,
        rate_limit_window_secs: 15 * 60,
    }
}

/// Loads configuration from a TOML file
pub fn config_from_file(config_path: Option<PathBuf>) -> Result<ConfigUpdate, String> {
    let Some(config_path) = config_path else {
        return Ok(ConfigUpdate::default());
    };

    if !config_path.exists() {
        info!("Config file not found at {:?}, using defaults", config_path);
        return Ok(ConfigUpdate::default());
    }

    match fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str::<ConfigUpdate>(&content) {
            Ok(config) => {
                info!("Loaded configuration from {:?}", config_path);
                Ok(config)
            }
            Err(e) => {
                warn!("Failed to parse config file: {}", e);
                Err(format!("Failed to parse config file: {}", e))
            }
        },
        Err(e) => {
            warn!("Failed to read config file: {}", e);
            Err(format!("Failed to read config file: {}", e))
        }
    }
}

/// Loads configuration from command line arguments
pub fn config_from_args(args: CliArgs) -> ConfigUpdate {
    ConfigUpdate {
        database_url: args.database_url,
        host: args.host,
        port: args.port,
        jwt_secret: args.jwt_secret,
        token_ttl_hours: args.token_ttl_hours,
        cors_origins: args.cors_origins,
        media_dir: args.media_dir,
        public_base_url: args.public_base_url,
        llm_base_url: args.llm_base_url,
        llm_api_key: args.llm_api_key,
        llm_model: args.llm_model,
        tts_base_url: args.tts_base_url,
        tts_api_key: args.tts_api_key,
        tts_voice_id: args.tts_voice_id,
        max_input_chars: args.max_input_chars,
        max_speech_chars: args.max_speech_chars,
        rate_limit_max: args.rate_limit_max,
        rate_limit_window_secs: args.rate_limit_window_secs,
        server_url: None,
    }
}

/// Returns the XDG config directory for EnzoLearn, if it can be determined
pub fn get_config_dir_path() -> Option<PathBuf> {
    match ProjectDirs::from("com", "enzolearn", "enzolearn") {
        Some(proj_dirs) => Some(proj_dirs.config_dir().to_path_buf()),
        None => {
            warn!("Could not determine XDG config directory, skipping config file");
            None
        }
    }
}

/// Gets the complete configuration by combining defaults with
/// values from config file, environment variables, and command line arguments
/// in order of increasing precedence
pub fn get_config(args: CliArgs) -> Config {
    let config_path = get_config_dir_path().and_then(|path| {
        if !path.exists() {
            info!("Config path not found at {:?}, using defaults", path);
            None
        } else {
            Some(path)
        }
    });

    let base = base_config(config_path.clone());
    let file_update = config_from_file(config_path.map(|path| path.join("config.toml"))).unwrap_or_default();

    let config = base.apply_update(file_update).apply_update(config_from_args(args));

    info!(
        "Final configuration: database_url={}, bind={}, media_dir={}, llm_model={}",
        config.database_url,
        config.bind_address(),
        config.media_dir,
        config.llm_model
    );

    config
}
