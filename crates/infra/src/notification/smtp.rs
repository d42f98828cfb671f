//! SMTP 通知送信実装
//!
//! lettre の `AsyncSmtpTransport` を使用してメールを送信する。
//! 接続は STARTTLS に昇格し、ログイン用の認証情報で認証する。

use std::time::Duration;

use async_trait::async_trait;
use freegames_domain::notification::{EmailMessage, NotificationError};
use lettre::{
    AsyncSmtpTransport,
    AsyncTransport,
    Tokio1Executor,
    message::{Message, MultiPart, SinglePart, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use super::NotificationSender;

/// SMTP 接続設定
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    /// SMTP サーバーのホスト名
    pub host:         String,
    /// SMTP サーバーのポート番号（STARTTLS の場合は通常 587）
    pub port:         u16,
    /// ログインユーザー名
    pub username:     String,
    /// ログインパスワード
    pub password:     String,
    /// 送信元メールアドレス（From ヘッダ）
    pub from_address: String,
    /// 接続・送信のタイムアウト
    pub timeout:      Duration,
}

/// SMTP 通知送信
///
/// `lettre::AsyncSmtpTransport<Tokio1Executor>` をラップする。
pub struct SmtpNotificationSender {
    transport:    AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpNotificationSender {
    /// 新しい SMTP 送信インスタンスを作成
    ///
    /// 接続はこの時点では行わず、最初の送信時に確立する。
    pub fn new(settings: SmtpSettings) -> Result<Self, NotificationError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
            .map_err(|e| NotificationError::SendFailed(format!("SMTP 設定不正: {e}")))?
            .port(settings.port)
            .credentials(Credentials::new(settings.username, settings.password))
            .timeout(Some(settings.timeout))
            .build();

        Ok(Self {
            transport,
            from_address: settings.from_address,
        })
    }
}

#[async_trait]
impl NotificationSender for SmtpNotificationSender {
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError> {
        let message =
            Message::builder()
                .from(self.from_address.parse().map_err(|e| {
                    NotificationError::SendFailed(format!("送信元アドレス不正: {e}"))
                })?)
                .to(email
                    .to
                    .parse()
                    .map_err(|e| NotificationError::SendFailed(format!("宛先アドレス不正: {e}")))?)
                .subject(&email.subject)
                .multipart(
                    MultiPart::alternative()
                        .singlepart(
                            SinglePart::builder()
                                .header(ContentType::TEXT_PLAIN)
                                .body(email.text_body.clone()),
                        )
                        .singlepart(
                            SinglePart::builder()
                                .header(ContentType::TEXT_HTML)
                                .body(email.html_body.clone()),
                        ),
                )
                .map_err(|e| NotificationError::SendFailed(format!("メッセージ構築失敗: {e}")))?;

        tracing::debug!(to = %email.to, "SMTP サーバーへ送信します");
        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| NotificationError::SendFailed(format!("SMTP 送信失敗: {e}")))?;

        tracing::debug!(code = %response.code(), "SMTP サーバーが受理しました");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_settings(from_address: &str) -> SmtpSettings {
        SmtpSettings {
            host:         "127.0.0.1".to_string(),
            port:         9,
            username:     "notifier@example.com".to_string(),
            password:     "secret".to_string(),
            from_address: from_address.to_string(),
            timeout:      Duration::from_secs(2),
        }
    }

    fn make_email(to: &str) -> EmailMessage {
        EmailMessage {
            to:        to.to_string(),
            subject:   "Free Games on Epic Games Store!".to_string(),
            html_body: "<p>Alan Wake</p>".to_string(),
            text_body: "Alan Wake".to_string(),
        }
    }

    #[test]
    fn トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SmtpNotificationSender>();
    }

    #[test]
    fn newは接続せずに初期化できる() {
        assert!(SmtpNotificationSender::new(make_settings("notifier@example.com")).is_ok());
    }

    #[tokio::test]
    async fn 送信元アドレスが不正な場合はsend_failedを返す() {
        let sender = SmtpNotificationSender::new(make_settings("not an address")).unwrap();

        let err = sender
            .send_email(&make_email("me@example.com"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("送信元アドレス不正"));
    }

    #[tokio::test]
    async fn 宛先アドレスが不正な場合はsend_failedを返す() {
        let sender = SmtpNotificationSender::new(make_settings("notifier@example.com")).unwrap();

        let err = sender.send_email(&make_email("")).await.unwrap_err();

        assert!(err.to_string().contains("宛先アドレス不正"));
    }

    #[tokio::test]
    async fn 接続できないサーバーへの送信はsend_failedを返す() {
        let sender = SmtpNotificationSender::new(make_settings("notifier@example.com")).unwrap();

        let err = sender
            .send_email(&make_email("me@example.com"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("SMTP 送信失敗"));
    }
}
