//! # FreeGames インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 責務
//!
//! - **カタログ取得**: ストアのプロモーション API への HTTP リクエスト
//! - **台帳の永続化**: 通知済み識別子の JSON ファイル
//! - **メール送信**: SMTP（STARTTLS + 認証）
//!
//! ## 依存関係
//!
//! ```text
//! notifier → infra → domain
//! ```
//!
//! ## モジュール構成
//!
//! - [`catalog_client`] - カタログ API クライアント
//! - [`ledger_store`] - 台帳ストア
//! - [`notification`] - メール送信
//! - [`error`] - インフラ層エラー定義

pub mod catalog_client;
pub mod error;
pub mod ledger_store;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod notification;

pub use catalog_client::{CatalogClient, HttpCatalogClient};
pub use error::{InfraError, InfraErrorKind};
pub use ledger_store::{JsonFileLedgerStore, LedgerStore};
