//! # 通知
//!
//! メール通知に関するドメインモデルを定義する。
//!
//! 送信手段（SMTP 等）はインフラ層、テンプレートからの生成はアプリケーション層が担い、
//! ここでは両者の間で受け渡すメッセージとエラーのみを定義する。

use thiserror::Error;

/// 通知メールの件名
pub const DIGEST_SUBJECT: &str = "Free Games on Epic Games Store!";

/// 通知送信エラー
#[derive(Debug, Error)]
pub enum NotificationError {
    /// メール送信に失敗
    #[error("メール送信に失敗: {0}")]
    SendFailed(String),

    /// テンプレートレンダリングに失敗
    #[error("テンプレートレンダリングに失敗: {0}")]
    TemplateFailed(String),
}

/// メールメッセージ
///
/// テンプレートレンダリングの出力。NotificationSender に渡される。
#[derive(Debug, Clone)]
pub struct EmailMessage {
    /// 送信先メールアドレス
    pub to:        String,
    /// 件名
    pub subject:   String,
    /// HTML 本文
    pub html_body: String,
    /// プレーンテキスト本文
    pub text_body: String,
}
