//! # FreeGames ドメイン層
//!
//! 無料配布タイトル通知の中核となるモデルと純粋なロジックを定義する。
//!
//! ## 依存関係の方向
//!
//! ```text
//! notifier → infra → domain
//! ```
//!
//! ドメイン層はネットワークやファイルに一切触れない。
//! カタログの取得や台帳ファイルの読み書きはインフラ層が担う。
//!
//! ## モジュール構成
//!
//! - [`offer`] - オファーとオファー識別子
//! - [`catalog`] - カタログ文書から無料オファーを抽出する
//! - [`ledger`] - 通知済み識別子の台帳（刈り込み・未通知抽出・追記）
//! - [`notification`] - メールメッセージと通知エラー
//! - [`clock`] - 時刻プロバイダ

pub mod catalog;
pub mod clock;
pub mod ledger;
pub mod notification;
pub mod offer;

pub use catalog::{CatalogDocument, CatalogError, extract_free_offers};
pub use ledger::{LedgerDocument, LedgerState};
pub use offer::{Offer, OfferIdentity};
