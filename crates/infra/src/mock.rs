//! # テスト用モック
//!
//! ユースケーステストで使用するインメモリ実装。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! freegames-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use freegames_domain::{
    catalog::CatalogDocument,
    ledger::{LedgerDocument, LedgerState},
    notification::{EmailMessage, NotificationError},
};

use crate::{
    catalog_client::CatalogClient,
    error::InfraError,
    ledger_store::LedgerStore,
    notification::NotificationSender,
};

// ===== MockCatalogClient =====

/// 固定のカタログ文書（または HTTP ステータス異常）を返すカタログクライアント
#[derive(Clone)]
pub struct MockCatalogClient {
    response:    Result<CatalogDocument, u16>,
    fetch_count: Arc<Mutex<usize>>,
}

impl MockCatalogClient {
    /// 常に `document` を返す
    pub fn with_document(document: CatalogDocument) -> Self {
        Self {
            response:    Ok(document),
            fetch_count: Arc::new(Mutex::new(0)),
        }
    }

    /// 常に `status` の HTTP ステータス異常で失敗する
    pub fn failing(status: u16) -> Self {
        Self {
            response:    Err(status),
            fetch_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn fetch_count(&self) -> usize {
        *self.fetch_count.lock().unwrap()
    }
}

#[async_trait]
impl CatalogClient for MockCatalogClient {
    async fn fetch(&self) -> Result<CatalogDocument, InfraError> {
        *self.fetch_count.lock().unwrap() += 1;
        match &self.response {
            Ok(document) => Ok(document.clone()),
            Err(status) => Err(InfraError::http_status(*status)),
        }
    }
}

// ===== MockNotificationSender =====

/// 送信したメールを記録する通知送信
///
/// `failing()` で作成すると常に送信失敗を返す（記録はしない）。
#[derive(Clone, Default)]
pub struct MockNotificationSender {
    sent:    Arc<Mutex<Vec<EmailMessage>>>,
    fail:    bool,
    attempt: Arc<Mutex<usize>>,
}

impl MockNotificationSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// 受理されたメール
    pub fn sent_emails(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// 成否にかかわらず送信が試みられた回数
    pub fn attempt_count(&self) -> usize {
        *self.attempt.lock().unwrap()
    }
}

#[async_trait]
impl NotificationSender for MockNotificationSender {
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError> {
        *self.attempt.lock().unwrap() += 1;
        if self.fail {
            return Err(NotificationError::SendFailed(
                "モック: SMTP 送信失敗".to_string(),
            ));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

// ===== InMemoryLedgerStore =====

/// メモリ上に永続化形式のまま台帳を保持するストア
#[derive(Clone, Default)]
pub struct InMemoryLedgerStore {
    document:   Arc<Mutex<Option<LedgerDocument>>>,
    corrupt:    bool,
    fail_save:  bool,
    save_count: Arc<Mutex<usize>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定したキーを保存済みの状態で作成する
    pub fn with_keys(keys: &[&str]) -> Self {
        let store = Self::new();
        *store.document.lock().unwrap() = Some(LedgerDocument {
            notified_games: keys.iter().map(|k| k.to_string()).collect(),
        });
        store
    }

    /// 読み込みが常にシリアライズエラーになるストア
    pub fn corrupt() -> Self {
        Self {
            corrupt: true,
            ..Self::default()
        }
    }

    /// 書き込みが常に失敗するストア
    pub fn failing_save(self) -> Self {
        Self {
            fail_save: true,
            ..self
        }
    }

    /// 現在保存されている永続化形式（未保存なら `None`）
    pub fn document(&self) -> Option<LedgerDocument> {
        self.document.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        *self.save_count.lock().unwrap()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn load(&self) -> Result<LedgerState, InfraError> {
        if self.corrupt {
            let err = serde_json::from_str::<LedgerDocument>("{ corrupt").unwrap_err();
            return Err(err.into());
        }
        Ok(self
            .document()
            .map(LedgerState::from_document)
            .unwrap_or_default())
    }

    async fn save(&self, state: &LedgerState) -> Result<(), InfraError> {
        *self.save_count.lock().unwrap() += 1;
        if self.fail_save {
            let err =
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "モック: 書き込み失敗");
            return Err(err.into());
        }
        *self.document.lock().unwrap() = Some(state.to_document());
        Ok(())
    }
}
