//! # FreeGames Notifier ライブラリ
//!
//! 設定とユースケースを公開する。
//! バイナリ（`main.rs`）と統合テストの双方から利用する。

pub mod config;
pub mod error;
pub mod usecase;
