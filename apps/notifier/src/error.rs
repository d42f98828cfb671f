//! # Notifier エラー定義
//!
//! 実行全体を失敗（非ゼロ終了）させるエラーを定義する。
//!
//! 台帳の読み書きや通知送信の失敗はここに含まれない。
//! それらはユースケース内で警告ログに変換され、終了コード 0 で終わる。

use freegames_domain::catalog::CatalogError;
use freegames_infra::InfraError;
use thiserror::Error;

/// 実行を中断するエラー
#[derive(Debug, Error)]
pub enum RunError {
    /// カタログの取得に失敗
    #[error("カタログの取得に失敗しました: {0}")]
    Fetch(#[source] InfraError),

    /// カタログの形式が想定と異なる
    #[error("カタログの解析に失敗しました: {0}")]
    Catalog(#[from] CatalogError),
}
