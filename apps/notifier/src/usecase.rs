//! # ユースケース層
//!
//! 1 回の実行（取得 → 抽出 → 未通知抽出 → 通知 → 台帳追記）を実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: カタログ取得・台帳・送信・時刻を `Arc<dyn Trait>` で外部から注入
//! - **薄い main**: main は設定読み込みと組み立てのみ行い、順序制御はユースケースに集約
//!
//! ## モジュール構成
//!
//! - [`check_free_games`] - 実行全体の順序制御
//! - [`notification`] - メール生成と送信

pub mod check_free_games;
pub mod notification;

pub use check_free_games::{CheckFreeGamesUseCase, RunOutcome};
pub use notification::{NotificationService, TemplateRenderer};
