//! # 通知台帳
//!
//! 通知済みオファーの識別子を保持する追記型の集合。
//!
//! ## 設計方針
//!
//! - **参照と書き込みの分離**: [`LedgerState::filter_new`] は状態を変更せず、
//!   [`LedgerState::commit`] は送信成功が確認された後にのみ呼ぶ
//! - **期限切れの刈り込み**: 読み込みのたびに [`LedgerState::prune`] で
//!   end_date から 30 日を超えたエントリを落とす。パースできない end_date は残す
//! - **永続化形式**: [`LedgerDocument`]（`{"notified_games": [...]}`）。入出力はインフラ層が担う

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::offer::{Offer, OfferIdentity};

/// end_date からこの日数を超えたエントリは期限切れ
pub const RETENTION_DAYS: i64 = 30;

/// 台帳ファイルの JSON 形式
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerDocument {
    pub notified_games: Vec<String>,
}

/// 永続化キーの end_date 部分から期限切れを判定する
///
/// 区切り文字を含まないキーやパースできない end_date は刈り込まない。
fn is_expired(key: &str, now: DateTime<Utc>) -> bool {
    OfferIdentity::parse(key)
        .and_then(|identity| identity.ends_at())
        .is_some_and(|ends_at| now - ends_at > Duration::days(RETENTION_DAYS))
}

/// 台帳の状態
///
/// 通知済みかどうかは永続化キー（`"{title}_{end_date}"`）の完全一致で判定する。
/// 順序は永続化時の安定性のためにソート済みで保持する。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerState {
    entries: BTreeSet<String>,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 永続化形式から復元する
    pub fn from_document(document: LedgerDocument) -> Self {
        Self {
            entries: document.notified_games.into_iter().collect(),
        }
    }

    /// 永続化形式に変換する
    pub fn to_document(&self) -> LedgerDocument {
        LedgerDocument {
            notified_games: self.entries.iter().cloned().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, identity: &OfferIdentity) -> bool {
        self.entries.contains(&identity.to_string())
    }

    /// 期限切れのエントリを取り除いた状態を返す
    pub fn prune(self, now: DateTime<Utc>) -> Self {
        Self {
            entries: self
                .entries
                .into_iter()
                .filter(|key| !is_expired(key, now))
                .collect(),
        }
    }

    /// 未通知のオファーだけを元の順序で返す
    ///
    /// 同じ識別子を持つオファーが複数ある場合は最初の 1 件のみ残す。
    pub fn filter_new(&self, offers: &[Offer]) -> Vec<Offer> {
        let mut seen = HashSet::new();
        offers
            .iter()
            .filter(|offer| {
                let identity = offer.identity();
                !self.contains(&identity) && seen.insert(identity)
            })
            .cloned()
            .collect()
    }

    /// 通知済みオファーの識別子を追加した状態を返す
    pub fn commit(mut self, offers: &[Offer]) -> Self {
        self.entries
            .extend(offers.iter().map(|offer| offer.identity().to_string()));
        self
    }
}
