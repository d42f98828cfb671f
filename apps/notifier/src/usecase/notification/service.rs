//! # 通知サービス
//!
//! テンプレートレンダリング → メール送信を統合するサービス。
//!
//! ## 設計方針
//!
//! - **境界でエラーを止める**: `notify()` は成否を `bool` で返し、エラーを伝播しない
//! - **依存性注入**: `NotificationSender` は trait で抽象化
//! - **宛先は固定**: 起動時の設定で決まる 1 アドレスのみ

use std::sync::Arc;

use freegames_domain::offer::Offer;
use freegames_infra::notification::NotificationSender;
use freegames_shared::{event_log::event, log_business_event};

use super::TemplateRenderer;

/// 通知サービス
pub struct NotificationService {
    sender:            Arc<dyn NotificationSender>,
    template_renderer: TemplateRenderer,
    recipient:         String,
}

impl NotificationService {
    pub fn new(
        sender: Arc<dyn NotificationSender>,
        template_renderer: TemplateRenderer,
        recipient: String,
    ) -> Self {
        Self {
            sender,
            template_renderer,
            recipient,
        }
    }

    /// オファー一覧を 1 通のメールで通知する
    ///
    /// トランスポートが受理した場合のみ `true`。
    /// レンダリング失敗・送信失敗はログ出力のみで `false` を返す。
    /// 空の一覧は呼び出し側の誤りであり、送信せずに `false` を返す。
    pub async fn notify(&self, offers: &[Offer]) -> bool {
        if offers.is_empty() {
            tracing::warn!("通知対象のオファーが空のため送信しません");
            return false;
        }

        let email = match self.template_renderer.render(offers, &self.recipient) {
            Ok(email) => email,
            Err(e) => {
                tracing::error!(error = %e, "通知テンプレートのレンダリングに失敗");
                return false;
            }
        };

        match self.sender.send_email(&email).await {
            Ok(()) => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_SENT,
                    event.result = event::result::SUCCESS,
                    notification.recipient = %self.recipient,
                    notification.offer_count = offers.len(),
                    "通知メール送信成功"
                );
                true
            }
            Err(e) => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_FAILED,
                    event.result = event::result::FAILURE,
                    notification.recipient = %self.recipient,
                    notification.offer_count = offers.len(),
                    error = %e,
                    "通知メール送信失敗"
                );
                false
            }
        }
    }
}
