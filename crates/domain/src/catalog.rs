//! # カタログ抽出
//!
//! ストアの `freeGamesPromotions` レスポンスを走査し、無料オファーの一覧に正規化する。
//!
//! ## 抽出ルール
//!
//! 1. `data.Catalog.searchStore.elements` が配列でない場合は [`CatalogError::Malformed`]
//! 2. デコードできないエントリ、`title` の無いエントリは警告ログを出してスキップ
//! 3. `promotions` の無いエントリはスキップ
//! 4. `price.totalPrice.discountPrice`（欠落時 0）が 0 以外ならスキップ
//! 5. `catalogNs.mappings` から空でない最初の `pageSlug` を採用。無ければスキップ
//! 6. 各プロモーション期間（`endDate` 必須）ごとに 1 件の [`Offer`] を生成
//!
//! 空の `elements` は `Ok(vec![])` であり、構造の欠落とは区別する。
//! 前者は「今日は無料タイトルなし」、後者は API の形式変更を意味する。

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::offer::{DEFAULT_DESCRIPTION, FREE_PRICE_LABEL, Offer};

/// カタログ文書（API レスポンスの JSON そのもの）
pub type CatalogDocument = Value;

/// エントリ一覧までのパス
const ELEMENTS_PATH: [&str; 4] = ["data", "Catalog", "searchStore", "elements"];

/// カタログ抽出エラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// 必須の構造パスが欠落している
    #[error("カタログの形式が不正です: {path} が見つかりません")]
    Malformed {
        /// 欠落していたパス（ドット区切り）
        path: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntry {
    title:       Option<String>,
    description: Option<String>,
    key_images:  Option<Vec<RawKeyImage>>,
    price:       Option<RawPrice>,
    catalog_ns:  Option<RawCatalogNs>,
    promotions:  Option<RawPromotions>,
}

#[derive(Debug, Deserialize)]
struct RawKeyImage {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPrice {
    total_price: Option<RawTotalPrice>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTotalPrice {
    discount_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawCatalogNs {
    mappings: Option<Vec<RawMapping>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMapping {
    page_slug: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPromotions {
    promotional_offers: Option<Vec<RawOfferGroup>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOfferGroup {
    promotional_offers: Option<Vec<RawWindow>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawWindow {
    start_date: Option<String>,
    end_date:   Option<String>,
}

impl RawEntry {
    fn discount_price(&self) -> f64 {
        self.price
            .as_ref()
            .and_then(|p| p.total_price.as_ref())
            .and_then(|t| t.discount_price)
            .unwrap_or(0.0)
    }

    fn page_slug(&self) -> Option<&str> {
        self.catalog_ns
            .as_ref()
            .and_then(|ns| ns.mappings.as_deref())
            .unwrap_or_default()
            .iter()
            .filter_map(|m| m.page_slug.as_deref())
            .find(|slug| !slug.is_empty())
    }

    fn image_url(&self) -> String {
        self.key_images
            .as_deref()
            .and_then(|images| images.first())
            .and_then(|image| image.url.clone())
            .unwrap_or_default()
    }

    fn windows(&self) -> impl Iterator<Item = &RawWindow> {
        self.promotions
            .iter()
            .flat_map(|p| p.promotional_offers.iter().flatten())
            .flat_map(|group| group.promotional_offers.iter().flatten())
    }
}

/// カタログ文書から無料オファーを抽出する
///
/// 返却順はカタログのエントリ順 → プロモーション期間順。
pub fn extract_free_offers(doc: &CatalogDocument) -> Result<Vec<Offer>, CatalogError> {
    let elements = locate_elements(doc)?;

    let mut offers = Vec::new();
    for (index, element) in elements.iter().enumerate() {
        let entry = match RawEntry::deserialize(element) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(index, error = %e, "デコードできないカタログエントリをスキップ");
                continue;
            }
        };
        offers.extend(offers_from_entry(index, &entry));
    }

    Ok(offers)
}

/// `data.Catalog.searchStore.elements` を辿る
fn locate_elements(doc: &CatalogDocument) -> Result<&Vec<Value>, CatalogError> {
    let mut current = doc;
    for (depth, segment) in ELEMENTS_PATH.iter().enumerate() {
        current = current
            .get(segment)
            .filter(|v| !v.is_null())
            .ok_or_else(|| CatalogError::Malformed {
                path: ELEMENTS_PATH[..=depth].join("."),
            })?;
    }

    current.as_array().ok_or_else(|| CatalogError::Malformed {
        path: ELEMENTS_PATH.join("."),
    })
}

fn offers_from_entry(index: usize, entry: &RawEntry) -> Vec<Offer> {
    if entry.promotions.is_none() {
        return Vec::new();
    }

    let Some(title) = entry.title.as_deref() else {
        tracing::warn!(index, "title の無いカタログエントリをスキップ");
        return Vec::new();
    };

    if entry.discount_price() != 0.0 {
        return Vec::new();
    }

    let Some(slug) = entry.page_slug() else {
        tracing::debug!(title, "pageSlug が無いためスキップ");
        return Vec::new();
    };

    entry
        .windows()
        .filter_map(|window| {
            let Some(end_date) = window.end_date.clone() else {
                tracing::warn!(title, "endDate の無いプロモーション期間をスキップ");
                return None;
            };
            Some(Offer {
                title: title.to_string(),
                description: entry
                    .description
                    .clone()
                    .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
                image_url: entry.image_url(),
                product_url: Offer::product_url_for(slug),
                original_price: FREE_PRICE_LABEL.to_string(),
                discounted_price: FREE_PRICE_LABEL.to_string(),
                start_date: window.start_date.clone(),
                end_date,
            })
        })
        .collect()
}
