//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` (or the file named by `FIHRIS_CONFIG`)
//! relative to the current working directory, then applies the
//! `FIHRIS_DB_PATH` and `FIHRIS_LOG_LEVEL` env overrides. Secrets
//! (`TELEGRAM_BOT_TOKEN`, `ANTHROPIC_API_KEY` / `LLM_API_KEY`) are only ever
//! read from the environment, never from TOML.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::AppError;

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// PTY (console) channel configuration.
#[derive(Debug, Clone)]
pub struct PtyConfig {
    pub enabled: bool,
}

/// Telegram channel configuration.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub enabled: bool,
}

/// Comms subsystem configuration.
#[derive(Debug, Clone)]
pub struct CommsConfig {
    pub pty: PtyConfig,
    pub telegram: TelegramConfig,
}

/// Query limits and reply shaping.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Row limit for command searches and the flexible fallback.
    pub limit: usize,
    /// How many full records a record-id lookup shows.
    pub record_preview: usize,
    /// Row limit for the excerpt handed to the language model.
    pub ai_context_limit: usize,
    /// Plain-text messages shorter than this (in chars) are rejected.
    pub min_query_chars: usize,
    /// Listing replies are split so no message exceeds this many chars.
    pub chunk_chars: usize,
}

/// Anthropic Messages API configuration (`[llm.anthropic]`).
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub api_base_url: String,
    pub model: String,
    pub api_version: String,
    pub max_tokens: u32,
    pub timeout_seconds: u64,
}

/// OpenAI / OpenAI-compatible provider configuration (`[llm.openai]`).
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Full chat completions endpoint URL.
    pub api_base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

/// LLM configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Which provider is active: `"none"`, `"dummy"`, `"anthropic"`, `"openai"`.
    /// Maps to `default` in `[llm]`.
    pub provider: String,
    pub anthropic: AnthropicConfig,
    pub openai: OpenAiConfig,
}

/// Fully-resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_name: String,
    /// Display name of the library used in welcome and statistics texts.
    pub library_name: String,
    pub log_level: String,
    /// Path of the SQLite catalog (already expanded, no `~`).
    pub db_path: PathBuf,
    pub search: SearchConfig,
    pub comms: CommsConfig,
    pub llm: LlmConfig,
    /// `TELEGRAM_BOT_TOKEN`, required when the Telegram channel is enabled.
    pub telegram_token: Option<String>,
    /// `ANTHROPIC_API_KEY`, falling back to `LLM_API_KEY`.
    pub llm_api_key: Option<String>,
}

impl Config {
    pub fn comms_pty_should_load(&self) -> bool {
        self.comms.pty.enabled
    }

    pub fn comms_telegram_should_load(&self) -> bool {
        self.comms.telegram.enabled
    }
}

// ── raw TOML shape ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RawConfig {
    bot: RawBot,
    catalog: RawCatalog,
    #[serde(default)]
    search: RawSearch,
    #[serde(default)]
    comms: RawComms,
    #[serde(default)]
    llm: RawLlm,
}

#[derive(Deserialize)]
struct RawBot {
    name: String,
    #[serde(default = "default_library_name")]
    library_name: String,
    #[serde(default = "default_log_level")]
    log_level: String,
}

#[derive(Deserialize)]
struct RawCatalog {
    db_path: String,
}

#[derive(Deserialize)]
struct RawSearch {
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default = "default_record_preview")]
    record_preview: usize,
    #[serde(default = "default_ai_context_limit")]
    ai_context_limit: usize,
    #[serde(default = "default_min_query_chars")]
    min_query_chars: usize,
    #[serde(default = "default_chunk_chars")]
    chunk_chars: usize,
}

impl Default for RawSearch {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            record_preview: default_record_preview(),
            ai_context_limit: default_ai_context_limit(),
            min_query_chars: default_min_query_chars(),
            chunk_chars: default_chunk_chars(),
        }
    }
}

#[derive(Deserialize, Default)]
struct RawComms {
    #[serde(default)]
    pty: RawPty,
    #[serde(default)]
    telegram: RawTelegram,
}

#[derive(Deserialize)]
struct RawPty {
    /// Defaults to `false`: the console is for local runs only.
    #[serde(default = "default_false")]
    enabled: bool,
}

#[derive(Deserialize)]
struct RawTelegram {
    #[serde(default = "default_true")]
    enabled: bool,
}

impl Default for RawPty {
    fn default() -> Self {
        Self { enabled: false }
    }
}

impl Default for RawTelegram {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Deserialize)]
struct RawLlm {
    #[serde(rename = "default", default = "default_llm_provider")]
    provider: String,
    #[serde(default)]
    anthropic: RawAnthropicConfig,
    #[serde(default)]
    openai: RawOpenAiConfig,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            anthropic: RawAnthropicConfig::default(),
            openai: RawOpenAiConfig::default(),
        }
    }
}

#[derive(Deserialize)]
struct RawAnthropicConfig {
    #[serde(default = "default_anthropic_api_base_url")]
    api_base_url: String,
    #[serde(default = "default_anthropic_model")]
    model: String,
    #[serde(default = "default_anthropic_version")]
    api_version: String,
    #[serde(default = "default_max_tokens")]
    max_tokens: u32,
    #[serde(default = "default_timeout_seconds")]
    timeout_seconds: u64,
}

impl Default for RawAnthropicConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_anthropic_api_base_url(),
            model: default_anthropic_model(),
            api_version: default_anthropic_version(),
            max_tokens: default_max_tokens(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

#[derive(Deserialize)]
struct RawOpenAiConfig {
    #[serde(default = "default_openai_api_base_url")]
    api_base_url: String,
    #[serde(default = "default_openai_model")]
    model: String,
    #[serde(default = "default_openai_temperature")]
    temperature: f32,
    #[serde(default = "default_timeout_seconds")]
    timeout_seconds: u64,
}

impl Default for RawOpenAiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_openai_api_base_url(),
            model: default_openai_model(),
            temperature: default_openai_temperature(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

fn default_library_name() -> String { "مكتبة الفهرس".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_limit() -> usize { 10 }
fn default_record_preview() -> usize { 5 }
fn default_ai_context_limit() -> usize { 15 }
fn default_min_query_chars() -> usize { 2 }
fn default_chunk_chars() -> usize { 3500 }
fn default_llm_provider() -> String { "anthropic".to_string() }
fn default_anthropic_api_base_url() -> String { "https://api.anthropic.com/v1/messages".to_string() }
fn default_anthropic_model() -> String { "claude-sonnet-4-20250514".to_string() }
fn default_anthropic_version() -> String { "2023-06-01".to_string() }
fn default_max_tokens() -> u32 { 1024 }
fn default_timeout_seconds() -> u64 { 60 }
fn default_openai_api_base_url() -> String { "https://api.openai.com/v1/chat/completions".to_string() }
fn default_openai_model() -> String { "gpt-4o-mini".to_string() }
fn default_openai_temperature() -> f32 { 0.2 }
fn default_true() -> bool { true }
fn default_false() -> bool { false }

// ── loading ───────────────────────────────────────────────────────────────────

/// Load config from `FIHRIS_CONFIG` or `config/default.toml`, then apply
/// env-var overrides and read secrets from the environment.
pub fn load() -> Result<Config, AppError> {
    let path = env::var("FIHRIS_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let db_path_override = env::var("FIHRIS_DB_PATH").ok();
    let log_level_override = env::var("FIHRIS_LOG_LEVEL").ok();

    let mut config = load_from(
        Path::new(&path),
        db_path_override.as_deref(),
        log_level_override.as_deref(),
    )?;
    config.telegram_token = non_empty_env("TELEGRAM_BOT_TOKEN");
    config.llm_api_key = non_empty_env("ANTHROPIC_API_KEY").or_else(|| non_empty_env("LLM_API_KEY"));
    Ok(config)
}

/// Internal loader — accepts an explicit path and optional overrides.
/// Tests pass overrides directly instead of mutating env vars; secrets are
/// left unset.
pub fn load_from(
    path: &Path,
    db_path_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let parsed: RawConfig = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    let search = parsed.search;
    if search.chunk_chars == 0 {
        return Err(AppError::Config("search.chunk_chars must be greater than zero".into()));
    }

    let db_path = expand_home(db_path_override.unwrap_or(&parsed.catalog.db_path));
    let log_level = log_level_override.unwrap_or(&parsed.bot.log_level).to_string();

    Ok(Config {
        bot_name: parsed.bot.name,
        library_name: parsed.bot.library_name,
        log_level,
        db_path,
        search: SearchConfig {
            limit: search.limit,
            record_preview: search.record_preview,
            ai_context_limit: search.ai_context_limit,
            min_query_chars: search.min_query_chars,
            chunk_chars: search.chunk_chars,
        },
        comms: CommsConfig {
            pty: PtyConfig { enabled: parsed.comms.pty.enabled },
            telegram: TelegramConfig { enabled: parsed.comms.telegram.enabled },
        },
        llm: LlmConfig {
            provider: parsed.llm.provider,
            anthropic: AnthropicConfig {
                api_base_url: parsed.llm.anthropic.api_base_url,
                model: parsed.llm.anthropic.model,
                api_version: parsed.llm.anthropic.api_version,
                max_tokens: parsed.llm.anthropic.max_tokens,
                timeout_seconds: parsed.llm.anthropic.timeout_seconds,
            },
            openai: OpenAiConfig {
                api_base_url: parsed.llm.openai.api_base_url,
                model: parsed.llm.openai.model,
                temperature: parsed.llm.openai.temperature,
                timeout_seconds: parsed.llm.openai.timeout_seconds,
            },
        },
        telegram_token: None,
        llm_api_key: None,
    })
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

// ── test helpers ──────────────────────────────────────────────────────────────

impl Config {
    /// Safe `Config` for tests: console only, no LLM, no secrets.
    pub fn test_default(db_path: &Path) -> Self {
        Self {
            bot_name: "test".into(),
            library_name: "Test Library".into(),
            log_level: "info".into(),
            db_path: db_path.to_path_buf(),
            search: SearchConfig {
                limit: default_limit(),
                record_preview: default_record_preview(),
                ai_context_limit: default_ai_context_limit(),
                min_query_chars: default_min_query_chars(),
                chunk_chars: default_chunk_chars(),
            },
            comms: CommsConfig {
                pty: PtyConfig { enabled: true },
                telegram: TelegramConfig { enabled: false },
            },
            llm: LlmConfig {
                provider: "none".into(),
                anthropic: AnthropicConfig {
                    api_base_url: "http://localhost:0/v1/messages".into(),
                    model: "test-model".into(),
                    api_version: default_anthropic_version(),
                    max_tokens: 64,
                    timeout_seconds: 1,
                },
                openai: OpenAiConfig {
                    api_base_url: "http://localhost:0/v1/chat/completions".into(),
                    model: "test-model".into(),
                    temperature: 0.0,
                    timeout_seconds: 1,
                },
            },
            telegram_token: None,
            llm_api_key: None,
        }
    }
}
