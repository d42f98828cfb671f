//! # ビジネスイベントログとエラーコンテキストの構造化ヘルパー
//!
//! `LOG_FORMAT=json` で出力したログを `jq` で調査しやすいよう、
//! ログフィールドの命名規約とヘルパーマクロを提供する。
//!
//! ## ビジネスイベント
//!
//! [`log_business_event!`] マクロで出力する。`event.kind = "business_event"` マーカーが
//! 自動付与され、`jq 'select(.["event.kind"] == "business_event")'` でフィルタできる。
//!
//! ## フィールド命名規約
//!
//! ドット記法（`event.category`、`error.kind`）を使用。tracing の
//! `$($field:ident).+` パターンでサポートされ、JSON 出力でフラットなキーになる。

/// ビジネスイベントを構造化ログとして出力する。
///
/// `event.kind = "business_event"` マーカーを自動付与し、
/// `tracing::info!` レベルで出力する。
///
/// ## 必須フィールド（慣例）
///
/// - `event.category`: イベントカテゴリ（[`event::category`] の定数を使用）
/// - `event.action`: アクション名（[`event::action`] の定数を使用）
/// - `event.result`: 結果（[`event::result`] の定数を使用）
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(
            event.kind = "business_event",
            $($args)*
        )
    };
}

/// イベントフィールドの定数
pub mod event {
    /// イベントカテゴリ
    pub mod category {
        pub const CATALOG: &str = "catalog";
        pub const NOTIFICATION: &str = "notification";
        pub const LEDGER: &str = "ledger";
    }

    /// イベントアクション
    pub mod action {
        // カタログ
        pub const CATALOG_FETCHED: &str = "catalog.fetched";

        // 通知
        pub const NOTIFICATION_SENT: &str = "notification.sent";
        pub const NOTIFICATION_FAILED: &str = "notification.failed";

        // 台帳
        pub const LEDGER_COMMITTED: &str = "ledger.committed";
        pub const LEDGER_COMMIT_FAILED: &str = "ledger.commit_failed";
    }

    /// イベント結果
    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const FAILURE: &str = "failure";
    }
}

/// エラーコンテキストフィールドの定数
pub mod error {
    /// エラーカテゴリ
    pub mod category {
        /// ファイル入出力（台帳）
        pub const INFRASTRUCTURE: &str = "infrastructure";
        /// 外部サービス呼び出し（カタログ API、SMTP）
        pub const EXTERNAL_SERVICE: &str = "external_service";
    }

    /// エラー種別
    pub mod kind {
        pub const CATALOG_FETCH: &str = "catalog_fetch";
        pub const CATALOG_FORMAT: &str = "catalog_format";
        pub const LEDGER_READ: &str = "ledger_read";
        pub const LEDGER_WRITE: &str = "ledger_write";
    }
}
