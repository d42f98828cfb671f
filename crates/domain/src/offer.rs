//! # オファー
//!
//! ストアのプロモーションで無料配布されているタイトルを表すドメインモデル。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 説明 |
//! |---|------------|------|
//! | [`Offer`] | オファー | 特定の期間に無料配布される 1 タイトル |
//! | [`OfferIdentity`] | オファー識別子 | 実行をまたいで同一の通知イベントを判定するキー |
//!
//! ## 設計方針
//!
//! - **構造化キー**: 識別子は `(title, end_date)` の組で保持し、文字列化は永続化境界でのみ行う
//! - **日時は API の表記をそのまま保持**: `2025-01-08T00:00:00.000Z` 形式。比較・表示時にパースする

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::Serialize;

/// 無料オファーの価格ラベル
pub const FREE_PRICE_LABEL: &str = "Free";

/// 説明文が無い場合のデフォルト
pub const DEFAULT_DESCRIPTION: &str = "No description available.";

/// 商品ページのベース URL（末尾に slug を付与する）
pub const PRODUCT_BASE_URL: &str = "https://store.epicgames.com/en-US/p";

/// 永続化形式での title と end_date の区切り文字
const IDENTITY_SEPARATOR: char = '_';

/// 無料オファー
///
/// カタログの 1 エントリとプロモーション期間 1 つの組み合わせ。
/// 同じエントリが複数の期間を持つ場合はそれぞれ別の `Offer` になる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Offer {
    pub title:            String,
    pub description:      String,
    pub image_url:        String,
    pub product_url:      String,
    pub original_price:   String,
    pub discounted_price: String,
    pub start_date:       Option<String>,
    pub end_date:         String,
}

impl Offer {
    /// slug から商品ページ URL を組み立てる
    pub fn product_url_for(slug: &str) -> String {
        format!("{PRODUCT_BASE_URL}/{slug}")
    }

    /// 通知済み判定に使う識別子を返す
    pub fn identity(&self) -> OfferIdentity {
        OfferIdentity::new(self.title.clone(), self.end_date.clone())
    }
}

/// オファー識別子
///
/// 同じタイトル・同じ終了日時のオファーは、カタログ上の別エントリであっても
/// 同一の通知イベントとして扱う。
///
/// 永続化形式は `"{title}_{end_date}"`。台帳はこの文字列の完全一致で照合する。
/// [`parse`](Self::parse) は刈り込みのために end_date を取り出す用途に限り、
/// 最後の `_` で分割する。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display("{title}_{end_date}")]
pub struct OfferIdentity {
    title:    String,
    end_date: String,
}

impl OfferIdentity {
    pub fn new(title: impl Into<String>, end_date: impl Into<String>) -> Self {
        Self {
            title:    title.into(),
            end_date: end_date.into(),
        }
    }

    /// 永続化形式の文字列から復元する
    ///
    /// 区切り文字を含まない文字列は `None`。
    pub fn parse(key: &str) -> Option<Self> {
        key.rsplit_once(IDENTITY_SEPARATOR)
            .map(|(title, end_date)| Self::new(title, end_date))
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn end_date(&self) -> &str {
        &self.end_date
    }

    /// 終了日時をパースする（失敗時は `None`）
    pub fn ends_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.end_date)
    }
}

/// API 形式の日時文字列（ISO-8601、ミリ秒 + `Z`）をパースする
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
