//! Configuration management
//!
//! 設定は以下の優先順位で読み込まれます:
//! 1. 環境変数
//! 2. jikoku.toml 設定ファイル
//! 3. デフォルト値
//!
//! 設定ファイル内では `${VAR_NAME}` 形式で環境変数を展開できます。

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::Error;

/// 返信形式
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStyle {
    /// Flex Message カード
    #[default]
    Card,
    /// プレーンテキスト
    Text,
}

impl ReplyStyle {
    fn from_name(name: &str) -> crate::Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "card" | "flex" => Ok(ReplyStyle::Card),
            "text" | "plain" => Ok(ReplyStyle::Text),
            other => Err(Error::Config(format!(
                "Unknown reply style '{}' (expected card or text)",
                other
            ))),
        }
    }
}

/// LINE channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineConfig {
    /// Channel secret (signature verification)
    #[serde(default, skip_serializing)]
    pub channel_secret: String,

    /// Channel access token (reply API)
    #[serde(default, skip_serializing)]
    pub channel_access_token: String,

    /// Webhook server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Webhook path
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            channel_secret: String::new(),
            channel_access_token: String::new(),
            port: default_port(),
            webhook_path: default_webhook_path(),
        }
    }
}

/// Scraping server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Base URL (e.g. `https://scraper.example.com`)
    #[serde(default)]
    pub base_url: String,

    /// Path appended to the base URL
    #[serde(default = "default_scraper_path")]
    pub path_name: String,

    /// Request timeout in seconds
    #[serde(default = "default_scraper_timeout")]
    pub timeout_secs: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            path_name: default_scraper_path(),
            timeout_secs: default_scraper_timeout(),
        }
    }
}

/// Card design assets. `None` means the bundled assets are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DesignConfig {
    /// Directory holding flex_message.json, body_contents_box.json, body_contents_separator.json
    pub template_dir: Option<String>,

    /// Icon map JSON file
    pub icons_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to SQLite database file
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplyConfig {
    #[serde(default)]
    pub style: ReplyStyle,
}

/// Main configuration for jikoku-gateway
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub line: LineConfig,

    #[serde(default)]
    pub scraper: ScraperConfig,

    #[serde(default)]
    pub design: DesignConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub reply: ReplyConfig,
}

fn default_port() -> u16 {
    8000
}

fn default_webhook_path() -> String {
    "/callback".to_string()
}

fn default_scraper_path() -> String {
    "time_table".to_string()
}

fn default_scraper_timeout() -> u64 {
    10
}

fn default_db_path() -> String {
    "data/jikoku.db".to_string()
}

impl Config {
    /// 設定ファイルから環境変数を展開する
    ///
    /// `${VAR_NAME}` 形式の文字列を環境変数の値に置換します。
    /// 環境変数が存在しない場合は空文字列になります。
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::new();
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next(); // '{' を消費

                let mut var_name = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    var_name.push(c);
                }

                if let Ok(env_value) = std::env::var(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// TOML 設定ファイルから設定を読み込む
    ///
    /// 設定ファイル内の `${VAR_NAME}` は環境変数の値に置換され、
    /// その後に環境変数による上書きが適用されます。
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();

        let toml_content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let expanded_content = Self::expand_env_vars(&toml_content);

        let config: TomlConfig = toml::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;

        let mut cfg = Self::from_toml_config(config)?;
        cfg.apply_env_overrides()?;
        cfg.validate()?;

        Ok(cfg)
    }

    /// デフォルトパスから設定を読み込む
    ///
    /// `./jikoku.toml` があればそれを使い、なければ環境変数のみから読み込みます。
    pub fn load() -> crate::Result<Self> {
        if Path::new("jikoku.toml").exists() {
            return Self::from_toml_file("jikoku.toml");
        }

        Self::from_env()
    }

    /// TOML 構造から Config を構築
    fn from_toml_config(toml: TomlConfig) -> crate::Result<Self> {
        let line = toml.line.unwrap_or_default();
        let scraper = toml.scraper.unwrap_or_default();
        let design = toml.design.unwrap_or_default();
        let store = toml.store.unwrap_or_default();
        let reply = toml.reply.unwrap_or_default();

        let style = match reply.style.as_deref() {
            Some(name) => ReplyStyle::from_name(name)?,
            None => ReplyStyle::default(),
        };

        Ok(Config {
            line: LineConfig {
                channel_secret: line.channel_secret.unwrap_or_default(),
                channel_access_token: line.channel_access_token.unwrap_or_default(),
                port: line.port.unwrap_or_else(default_port),
                webhook_path: line.webhook_path.unwrap_or_else(default_webhook_path),
            },
            scraper: ScraperConfig {
                base_url: scraper.base_url.unwrap_or_default(),
                path_name: scraper.path_name.unwrap_or_else(default_scraper_path),
                timeout_secs: scraper.timeout_secs.unwrap_or_else(default_scraper_timeout),
            },
            design: DesignConfig {
                template_dir: design.template_dir,
                icons_path: design.icons_path,
            },
            store: StoreConfig {
                db_path: store.db_path.unwrap_or_else(default_db_path),
            },
            reply: ReplyConfig { style },
        })
    }

    /// 環境変数で設定を上書きする
    fn apply_env_overrides(&mut self) -> crate::Result<()> {
        if let Ok(secret) = std::env::var("LINE_CHANNEL_SECRET") {
            self.line.channel_secret = secret;
        }
        if let Ok(token) = std::env::var("LINE_CHANNEL_ACCESS_TOKEN") {
            self.line.channel_access_token = token;
        }
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(p) = port.parse() {
                self.line.port = p;
            }
        }
        if let Ok(path) = std::env::var("LINE_WEBHOOK_PATH") {
            if !path.is_empty() {
                self.line.webhook_path = path;
            }
        }

        if let Ok(base_url) = std::env::var("WEB_SCRAPER_BASE_URL") {
            if !base_url.is_empty() {
                self.scraper.base_url = base_url;
            }
        }
        if let Ok(path) = std::env::var("WEB_SCRAPER_PATH") {
            if !path.is_empty() {
                self.scraper.path_name = path;
            }
        }
        if let Ok(timeout) = std::env::var("WEB_SCRAPER_TIMEOUT_SECS") {
            self.scraper.timeout_secs = timeout.trim().parse().map_err(|_| {
                Error::Config(format!("Invalid WEB_SCRAPER_TIMEOUT_SECS: {}", timeout))
            })?;
        }

        if let Ok(dir) = std::env::var("DESIGN_DIR") {
            self.design.template_dir = Some(dir);
        }
        if let Ok(path) = std::env::var("ICONS_PATH") {
            self.design.icons_path = Some(path);
        }

        if let Ok(path) = std::env::var("DB_PATH") {
            self.store.db_path = path;
        }

        if let Ok(style) = std::env::var("REPLY_STYLE") {
            self.reply.style = ReplyStyle::from_name(&style)?;
        }

        Ok(())
    }

    /// Load configuration from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut cfg = Config::default();
        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// 必須項目の確認
    fn validate(&self) -> crate::Result<()> {
        if self.line.channel_secret.is_empty() {
            return Err(Error::Config("LINE_CHANNEL_SECRET not set".to_string()));
        }
        if self.line.channel_access_token.is_empty() {
            return Err(Error::Config("LINE_CHANNEL_ACCESS_TOKEN not set".to_string()));
        }
        if self.scraper.base_url.is_empty() {
            return Err(Error::Config("WEB_SCRAPER_BASE_URL not set".to_string()));
        }
        if self.scraper.timeout_secs == 0 {
            return Err(Error::Config(
                "WEB_SCRAPER_TIMEOUT_SECS must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// TOML 構造体定義（ファイル解析用）
// ============================================================================

#[derive(Debug, Deserialize)]
struct TomlConfig {
    line: Option<TomlLineConfig>,
    scraper: Option<TomlScraperConfig>,
    design: Option<TomlDesignConfig>,
    store: Option<TomlStoreConfig>,
    reply: Option<TomlReplyConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlLineConfig {
    #[serde(default)]
    channel_secret: Option<String>,
    #[serde(default)]
    channel_access_token: Option<String>,
    #[serde(default)]
    port: Option<u16>,
    #[serde(default)]
    webhook_path: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlScraperConfig {
    base_url: Option<String>,
    path_name: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlDesignConfig {
    template_dir: Option<String>,
    icons_path: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlStoreConfig {
    db_path: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlReplyConfig {
    /// "card" または "text"
    style: Option<String>,
}
