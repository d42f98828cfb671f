//! # テンプレートレンダラー
//!
//! tera テンプレートエンジンで通知メールを HTML/plaintext 両形式で生成する。
//!
//! ## 設計方針
//!
//! - **`include_str!` によるコンパイル時埋め込み**: テンプレートはバイナリに埋め込まれる
//! - **1 通に全オファー**: オファーごとに 1 セクション（画像、タイトル、説明、価格、リンク、終了日時）
//! - **終了日時は人が読める形式**: `January 09, 2025 at 04:00 PM`。パースできない場合は元の文字列

use freegames_domain::{
    notification::{DIGEST_SUBJECT, EmailMessage, NotificationError},
    offer::{Offer, parse_timestamp},
};
use serde::Serialize;
use tera::{Context, Tera};

const TEMPLATE_NAME: &str = "free_games";

/// 終了日時の表示形式
const ENDS_AT_FORMAT: &str = "%B %d, %Y at %I:%M %p";

/// テンプレートに渡すオファー 1 件分の値
#[derive(Debug, Serialize)]
struct OfferView<'a> {
    title:       &'a str,
    description: &'a str,
    image_url:   &'a str,
    product_url: &'a str,
    price_label: &'a str,
    ends_at:     String,
}

impl<'a> From<&'a Offer> for OfferView<'a> {
    fn from(offer: &'a Offer) -> Self {
        Self {
            title:       &offer.title,
            description: &offer.description,
            image_url:   &offer.image_url,
            product_url: &offer.product_url,
            price_label: &offer.original_price,
            ends_at:     format_ends_at(&offer.end_date),
        }
    }
}

/// 終了日時を表示用に整形する
fn format_ends_at(end_date: &str) -> String {
    match parse_timestamp(end_date) {
        Some(ends_at) => ends_at.format(ENDS_AT_FORMAT).to_string(),
        None => {
            tracing::error!(end_date, "終了日時をパースできません");
            end_date.to_string()
        }
    }
}

/// テンプレートレンダラー
///
/// tera テンプレートエンジンをラップし、オファー一覧から `EmailMessage` を生成する。
pub struct TemplateRenderer {
    engine: Tera,
}

impl TemplateRenderer {
    /// 新しいレンダラーインスタンスを作成
    ///
    /// `include_str!` で埋め込んだテンプレートを tera に登録する。
    pub fn new() -> Result<Self, NotificationError> {
        let mut engine = Tera::default();

        engine
            .add_raw_templates(vec![
                (
                    "free_games.html",
                    include_str!("../../../templates/notifications/free_games.html"),
                ),
                (
                    "free_games.txt",
                    include_str!("../../../templates/notifications/free_games.txt"),
                ),
            ])
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;

        Ok(Self { engine })
    }

    /// オファー一覧から通知メールを生成する
    ///
    /// # 引数
    ///
    /// - `offers`: 通知対象のオファー（空でないこと）
    /// - `recipient`: 送信先メールアドレス
    pub fn render(&self, offers: &[Offer], recipient: &str) -> Result<EmailMessage, NotificationError> {
        let views: Vec<OfferView<'_>> = offers.iter().map(OfferView::from).collect();

        let mut context = Context::new();
        context.insert("offers", &views);

        let html_body = self
            .engine
            .render(&format!("{TEMPLATE_NAME}.html"), &context)
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;

        let text_body = self
            .engine
            .render(&format!("{TEMPLATE_NAME}.txt"), &context)
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;

        Ok(EmailMessage {
            to: recipient.to_string(),
            subject: DIGEST_SUBJECT.to_string(),
            html_body,
            text_body,
        })
    }
}

#[cfg(test)]
mod tests {
    use freegames_domain::offer::FREE_PRICE_LABEL;
    use rstest::rstest;

    use super::*;

    fn make_offer(title: &str, end_date: &str) -> Offer {
        Offer {
            title:            title.to_string(),
            description:      "A writer's nightmare.".to_string(),
            image_url:        "https://cdn.example.com/alan-wide.jpg".to_string(),
            product_url:      Offer::product_url_for("alan-wake"),
            original_price:   FREE_PRICE_LABEL.to_string(),
            discounted_price: FREE_PRICE_LABEL.to_string(),
            start_date:       Some("2025-01-01T00:00:00.000Z".to_string()),
            end_date:         end_date.to_string(),
        }
    }

    #[test]
    fn newが正常に初期化される() {
        let renderer = TemplateRenderer::new();
        assert!(renderer.is_ok());
    }

    #[test]
    fn 件名と宛先が正しい() {
        let renderer = TemplateRenderer::new().unwrap();

        let email = renderer
            .render(&[make_offer("Alan Wake", "2025-01-09T16:00:00.000Z")], "me@example.com")
            .unwrap();

        assert_eq!(email.to, "me@example.com");
        assert_eq!(email.subject, "Free Games on Epic Games Store!");
    }

    #[test]
    fn 各オファーのセクションが含まれる() {
        let renderer = TemplateRenderer::new().unwrap();
        let offers = vec![
            make_offer("Alan Wake", "2025-01-09T16:00:00.000Z"),
            make_offer("Control", "2025-01-16T16:00:00.000Z"),
        ];

        let email = renderer.render(&offers, "me@example.com").unwrap();

        for body in [&email.html_body, &email.text_body] {
            assert!(body.contains("Alan Wake"));
            assert!(body.contains("Control"));
            assert!(body.contains("Price: "));
            assert!(body.contains("Free"));
            assert!(body.contains("January 09, 2025 at 04:00 PM"));
            assert!(body.contains("January 16, 2025 at 04:00 PM"));
        }
        assert!(
            email
                .text_body
                .contains("Claim: https://store.epicgames.com/en-US/p/alan-wake")
        );
        // HTML では URL 中の `/` もエスケープされる
        assert!(email.html_body.contains("<img src=\"https:&#x2F;&#x2F;cdn.example.com"));
        assert!(email.html_body.contains("<a href=\"https:&#x2F;&#x2F;store.epicgames.com"));
    }

    #[test]
    fn htmlではタイトルがエスケープされる() {
        let renderer = TemplateRenderer::new().unwrap();

        let email = renderer
            .render(&[make_offer("<script>", "2025-01-09T16:00:00.000Z")], "me@example.com")
            .unwrap();

        assert!(!email.html_body.contains("<script>"));
        assert!(email.html_body.contains("&lt;script&gt;"));
    }

    #[test]
    fn 画像が無い場合はimgタグを出力しない() {
        let renderer = TemplateRenderer::new().unwrap();
        let mut offer = make_offer("Alan Wake", "2025-01-09T16:00:00.000Z");
        offer.image_url = String::new();

        let email = renderer.render(&[offer], "me@example.com").unwrap();

        assert!(!email.html_body.contains("<img"));
    }

    #[rstest]
    #[case("2025-01-09T16:00:00.000Z", "January 09, 2025 at 04:00 PM")]
    #[case("2025-12-31T00:30:00.000Z", "December 31, 2025 at 12:30 AM")]
    #[case("soon", "soon")]
    fn format_ends_atの結果が正しい(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(format_ends_at(input), expected);
    }
}
