//! # Notifier 設定
//!
//! 環境変数から 1 回の実行に必要な設定を読み込む。
//!
//! 設定は `main` で 1 度だけ構築し、各コンポーネントへ値として渡す。
//! コンポーネントの内部で環境変数を読むことはない。

use std::{env, path::PathBuf, str::FromStr, time::Duration};

use freegames_infra::{
    catalog_client::DEFAULT_CATALOG_URL,
    ledger_store::DEFAULT_LEDGER_PATH,
};
use strum::EnumString;
use thiserror::Error;

/// HTTP / SMTP タイムアウトの既定値（秒）
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// 設定エラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// 必須の環境変数が未設定（空文字を含む）
    #[error("{0} が設定されていません")]
    Missing(&'static str),

    /// 値の形式が不正
    #[error("{name} は{expected}である必要があります: {value:?}")]
    Invalid {
        name:     &'static str,
        value:    String,
        expected: &'static str,
    },
}

/// 通知の送信バックエンド
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum NotificationBackend {
    /// SMTP サーバー経由で送信
    #[default]
    Smtp,
    /// 送信しない（ログ出力のみ）
    Noop,
}

/// Notifier の設定
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// カタログ API の URL
    pub catalog_url:  String,
    /// カタログ取得のタイムアウト
    pub http_timeout: Duration,
    /// 台帳ファイルのパス
    pub ledger_path:  PathBuf,
    /// 通知設定
    pub notification: NotificationConfig,
}

/// 通知機能の設定
#[derive(Clone)]
pub struct NotificationConfig {
    /// 送信バックエンド
    pub backend:      NotificationBackend,
    /// SMTP ホスト
    pub smtp_server:  String,
    /// SMTP ポート
    pub smtp_port:    u16,
    /// SMTP ログインユーザー
    pub login:        String,
    /// SMTP ログインパスワード
    pub password:     String,
    /// 送信元メールアドレス
    pub from_address: String,
    /// 送信先メールアドレス
    pub to_address:   String,
    /// SMTP 接続・送信のタイムアウト
    pub smtp_timeout: Duration,
}

// パスワードをログに出さないため手動実装
impl std::fmt::Debug for NotificationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationConfig")
            .field("backend", &self.backend)
            .field("smtp_server", &self.smtp_server)
            .field("smtp_port", &self.smtp_port)
            .field("login", &self.login)
            .field("password", &"***")
            .field("from_address", &self.from_address)
            .field("to_address", &self.to_address)
            .field("smtp_timeout", &self.smtp_timeout)
            .finish()
    }
}

impl NotifierConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 任意の参照関数から設定を読み込む
    ///
    /// テストでは `HashMap` 等を渡してプロセスの環境変数に依存せずに検証する。
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars { lookup };

        Ok(Self {
            catalog_url:  vars
                .optional("CATALOG_URL")
                .unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string()),
            http_timeout: vars.timeout("HTTP_TIMEOUT_SECS")?,
            ledger_path:  vars
                .optional("LEDGER_PATH")
                .map_or_else(|| PathBuf::from(DEFAULT_LEDGER_PATH), PathBuf::from),
            notification: NotificationConfig::from_vars(&vars)?,
        })
    }
}

impl NotificationConfig {
    fn from_vars<F: Fn(&str) -> Option<String>>(vars: &Vars<F>) -> Result<Self, ConfigError> {
        Ok(Self {
            backend:      vars.parse_or_default("NOTIFICATION_BACKEND", "smtp または noop")?,
            smtp_server:  vars.required("SMTP_SERVER")?,
            smtp_port:    vars.parse_required("SMTP_PORT", "有効なポート番号")?,
            login:        vars.required("EMAIL")?,
            password:     vars.required("PASSWORD")?,
            from_address: vars.required("FROM_EMAIL")?,
            to_address:   vars.required("TO_EMAIL")?,
            smtp_timeout: vars.timeout("SMTP_TIMEOUT_SECS")?,
        })
    }
}

/// 環境変数の読み取りヘルパー
struct Vars<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    /// 空白のみの値は未設定として扱う
    fn optional(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        self.optional(name).ok_or(ConfigError::Missing(name))
    }

    fn parse_required<T: FromStr>(
        &self,
        name: &'static str,
        expected: &'static str,
    ) -> Result<T, ConfigError> {
        let value = self.required(name)?;
        value.parse().map_err(|_| ConfigError::Invalid {
            name,
            value,
            expected,
        })
    }

    fn parse_or_default<T: FromStr + Default>(
        &self,
        name: &'static str,
        expected: &'static str,
    ) -> Result<T, ConfigError> {
        match self.optional(name) {
            None => Ok(T::default()),
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name,
                value,
                expected,
            }),
        }
    }

    fn timeout(&self, name: &'static str) -> Result<Duration, ConfigError> {
        let secs = match self.optional(name) {
            None => DEFAULT_TIMEOUT_SECS,
            Some(value) => match value.parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::Invalid {
                        name,
                        value,
                        expected: "1 以上の秒数",
                    });
                }
            },
        };
        Ok(Duration::from_secs(secs))
    }
}
