//! # 無料タイトル確認ユースケース
//!
//! 1 回の実行を順に進める。分岐はあるが後戻りはしない。
//!
//! ```text
//! FETCH → EXTRACT → FILTER ─(新規なし)→ 終了
//!                      └→ NOTIFY ─(失敗)→ 終了（警告）
//!                            └→ COMMIT → 終了
//! ```
//!
//! ## 失敗時の扱い
//!
//! | ステージ | 失敗時 | 終了コード |
//! |---|---|---|
//! | FETCH / EXTRACT | [`RunError`] を返す | 非ゼロ |
//! | FILTER（台帳読み込み） | 空の台帳として続行 | 0 |
//! | NOTIFY | 台帳に追記せず終了 | 0 |
//! | COMMIT（台帳書き込み） | 警告して終了。次回は同じオファーを再通知する | 0 |
//!
//! 台帳への追記は送信成功を確認した後にのみ行う。送信失敗時に追記すると、
//! そのオファーは次回以降も通知されないまま失われる。
//!
//! ドライラン（[`CheckFreeGamesUseCase::dry_run`]）では実際に届いたメールが無いため、
//! NOTIFY の結果に関わらず COMMIT を行わない。

use std::sync::Arc;

use freegames_domain::{catalog::extract_free_offers, clock::Clock, ledger::LedgerState};
use freegames_infra::{catalog_client::CatalogClient, ledger_store::LedgerStore};
use freegames_shared::{
    event_log::{error, event},
    log_business_event,
};

use super::NotificationService;
use crate::error::RunError;

/// 1 回の実行結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// 未通知のオファーが無い（`found` はカタログ上の無料オファー数）
    NoNewOffers { found: usize },
    /// 通知し、台帳に追記した
    Notified { count: usize },
    /// 通知に失敗した（台帳は変更していない）
    NotifyFailed { count: usize },
    /// 通知は成功したが台帳の書き込みに失敗した
    CommitFailed { count: usize },
    /// ドライランのため台帳を変更せずに終了した
    DryRun { count: usize },
}

/// 無料タイトル確認ユースケース
pub struct CheckFreeGamesUseCase {
    catalog_client: Arc<dyn CatalogClient>,
    ledger_store:   Arc<dyn LedgerStore>,
    notifier:       NotificationService,
    clock:          Arc<dyn Clock>,
    dry_run:        bool,
}

impl CheckFreeGamesUseCase {
    pub fn new(
        catalog_client: Arc<dyn CatalogClient>,
        ledger_store: Arc<dyn LedgerStore>,
        notifier: NotificationService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog_client,
            ledger_store,
            notifier,
            clock,
            dry_run: false,
        }
    }

    /// ドライランを有効にする（台帳を書き込まない）
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// 1 回分の処理を実行する
    pub async fn execute(&self) -> Result<RunOutcome, RunError> {
        tracing::info!("無料タイトルを取得します");
        let document = match self.catalog_client.fetch().await {
            Ok(document) => document,
            Err(e) => {
                tracing::error!(
                    error.category = error::category::EXTERNAL_SERVICE,
                    error.kind = error::kind::CATALOG_FETCH,
                    error = %e,
                    "カタログの取得に失敗"
                );
                return Err(RunError::Fetch(e));
            }
        };

        let offers = match extract_free_offers(&document) {
            Ok(offers) => offers,
            Err(e) => {
                tracing::error!(
                    error.category = error::category::EXTERNAL_SERVICE,
                    error.kind = error::kind::CATALOG_FORMAT,
                    error = %e,
                    "カタログの解析に失敗"
                );
                return Err(e.into());
            }
        };
        log_business_event!(
            event.category = event::category::CATALOG,
            event.action = event::action::CATALOG_FETCHED,
            event.result = event::result::SUCCESS,
            catalog.free_offer_count = offers.len(),
            "カタログを取得しました"
        );

        let ledger = match self.ledger_store.load().await {
            Ok(ledger) => ledger,
            Err(e) => {
                tracing::warn!(
                    error.category = error::category::INFRASTRUCTURE,
                    error.kind = error::kind::LEDGER_READ,
                    error = %e,
                    "台帳を読み込めないため空の台帳として続行します"
                );
                LedgerState::new()
            }
        };
        let ledger = ledger.prune(self.clock.now());

        let new_offers = ledger.filter_new(&offers);
        if new_offers.is_empty() {
            tracing::info!(found = offers.len(), "未通知の無料タイトルはありません");
            return Ok(RunOutcome::NoNewOffers {
                found: offers.len(),
            });
        }

        let count = new_offers.len();
        tracing::info!(count, "未通知の無料タイトルを通知します");
        if !self.notifier.notify(&new_offers).await {
            tracing::warn!(count, "通知に失敗したため台帳は更新しません");
            return Ok(RunOutcome::NotifyFailed { count });
        }

        if self.dry_run {
            tracing::info!(count, "ドライランのため台帳は更新しません");
            return Ok(RunOutcome::DryRun { count });
        }

        let ledger = ledger.commit(&new_offers);
        match self.ledger_store.save(&ledger).await {
            Ok(()) => {
                log_business_event!(
                    event.category = event::category::LEDGER,
                    event.action = event::action::LEDGER_COMMITTED,
                    event.result = event::result::SUCCESS,
                    ledger.added = count,
                    ledger.total = ledger.len(),
                    "台帳に追記しました"
                );
                Ok(RunOutcome::Notified { count })
            }
            Err(e) => {
                log_business_event!(
                    event.category = event::category::LEDGER,
                    event.action = event::action::LEDGER_COMMIT_FAILED,
                    event.result = event::result::FAILURE,
                    error.category = error::category::INFRASTRUCTURE,
                    error.kind = error::kind::LEDGER_WRITE,
                    error = %e,
                    "台帳の書き込みに失敗しました（次回同じタイトルを再通知します）"
                );
                Ok(RunOutcome::CommitFailed { count })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use freegames_domain::clock::FixedClock;
    use freegames_infra::{
        mock::{InMemoryLedgerStore, MockCatalogClient, MockNotificationSender},
        notification::{NoopNotificationSender, NotificationSender},
    };
    use serde_json::{Value, json};

    use super::*;
    use crate::usecase::TemplateRenderer;

    const ALAN_WAKE_KEY: &str = "Alan Wake_2025-01-08T00:00:00.000Z";

    fn alan_wake_catalog() -> Value {
        json!({ "data": { "Catalog": { "searchStore": { "elements": [ {
            "title": "Alan Wake",
            "description": "A writer's nightmare.",
            "keyImages": [ { "url": "https://cdn.example.com/alan.jpg" } ],
            "price": { "totalPrice": { "discountPrice": 0 } },
            "catalogNs": { "mappings": [ { "pageSlug": "alan-wake" } ] },
            "promotions": { "promotionalOffers": [ { "promotionalOffers": [ {
                "startDate": "2025-01-01T00:00:00.000Z",
                "endDate": "2025-01-08T00:00:00.000Z"
            } ] } ] }
        } ] } } } })
    }

    fn make_usecase(
        catalog: MockCatalogClient,
        ledger: InMemoryLedgerStore,
        sender: MockNotificationSender,
    ) -> CheckFreeGamesUseCase {
        make_usecase_with_sender(catalog, ledger, Arc::new(sender))
    }

    fn make_usecase_with_sender(
        catalog: MockCatalogClient,
        ledger: InMemoryLedgerStore,
        sender: Arc<dyn NotificationSender>,
    ) -> CheckFreeGamesUseCase {
        let notifier = NotificationService::new(
            sender,
            TemplateRenderer::new().unwrap(),
            "me@example.com".to_string(),
        );
        let now = Utc.with_ymd_and_hms(2025, 1, 5, 0, 0, 0).unwrap();
        CheckFreeGamesUseCase::new(
            Arc::new(catalog),
            Arc::new(ledger),
            notifier,
            Arc::new(FixedClock::new(now)),
        )
    }

    #[tokio::test]
    async fn 新規オファーを通知し台帳に追記する() {
        let catalog = MockCatalogClient::with_document(alan_wake_catalog());
        let ledger = InMemoryLedgerStore::new();
        let sender = MockNotificationSender::new();
        let usecase = make_usecase(catalog.clone(), ledger.clone(), sender.clone());

        let outcome = usecase.execute().await.unwrap();

        assert_eq!(outcome, RunOutcome::Notified { count: 1 });
        assert_eq!(catalog.fetch_count(), 1);
        assert_eq!(sender.sent_emails().len(), 1);
        assert_eq!(
            ledger.document().unwrap().notified_games,
            vec![ALAN_WAKE_KEY.to_string()]
        );
    }

    #[tokio::test]
    async fn 通知済みのみの場合は送信も書き込みもしない() {
        let ledger = InMemoryLedgerStore::with_keys(&[ALAN_WAKE_KEY]);
        let sender = MockNotificationSender::new();
        let usecase = make_usecase(
            MockCatalogClient::with_document(alan_wake_catalog()),
            ledger.clone(),
            sender.clone(),
        );

        let outcome = usecase.execute().await.unwrap();

        assert_eq!(outcome, RunOutcome::NoNewOffers { found: 1 });
        assert_eq!(sender.attempt_count(), 0);
        assert_eq!(ledger.save_count(), 0);
    }

    #[tokio::test]
    async fn 送信失敗時は台帳を更新しない() {
        let ledger = InMemoryLedgerStore::new();
        let sender = MockNotificationSender::failing();
        let usecase = make_usecase(
            MockCatalogClient::with_document(alan_wake_catalog()),
            ledger.clone(),
            sender.clone(),
        );

        let outcome = usecase.execute().await.unwrap();

        assert_eq!(outcome, RunOutcome::NotifyFailed { count: 1 });
        assert_eq!(sender.attempt_count(), 1);
        assert_eq!(ledger.save_count(), 0);
        assert!(ledger.document().is_none());
    }

    #[tokio::test]
    async fn 取得失敗はエラーを返し送信しない() {
        let catalog = MockCatalogClient::failing(500);
        let sender = MockNotificationSender::new();
        let usecase = make_usecase(catalog.clone(), InMemoryLedgerStore::new(), sender.clone());

        let err = usecase.execute().await.unwrap_err();

        assert!(matches!(err, RunError::Fetch(_)));
        assert_eq!(catalog.fetch_count(), 1);
        assert_eq!(sender.attempt_count(), 0);
    }

    #[tokio::test]
    async fn 形式不正のカタログはエラーを返す() {
        let usecase = make_usecase(
            MockCatalogClient::with_document(json!({ "data": { "Catalog": null } })),
            InMemoryLedgerStore::new(),
            MockNotificationSender::new(),
        );

        let err = usecase.execute().await.unwrap_err();

        assert!(matches!(err, RunError::Catalog(_)));
    }

    #[tokio::test]
    async fn 空のカタログは正常終了する() {
        let usecase = make_usecase(
            MockCatalogClient::with_document(
                json!({ "data": { "Catalog": { "searchStore": { "elements": [] } } } }),
            ),
            InMemoryLedgerStore::new(),
            MockNotificationSender::new(),
        );

        let outcome = usecase.execute().await.unwrap();

        assert_eq!(outcome, RunOutcome::NoNewOffers { found: 0 });
    }

    #[tokio::test]
    async fn 台帳が破損していても空の台帳として通知する() {
        let sender = MockNotificationSender::new();
        let usecase = make_usecase(
            MockCatalogClient::with_document(alan_wake_catalog()),
            InMemoryLedgerStore::corrupt(),
            sender.clone(),
        );

        let outcome = usecase.execute().await.unwrap();

        assert_eq!(outcome, RunOutcome::Notified { count: 1 });
        assert_eq!(sender.sent_emails().len(), 1);
    }

    #[tokio::test]
    async fn 台帳の書き込み失敗は警告として扱う() {
        let ledger = InMemoryLedgerStore::new().failing_save();
        let usecase = make_usecase(
            MockCatalogClient::with_document(alan_wake_catalog()),
            ledger.clone(),
            MockNotificationSender::new(),
        );

        let outcome = usecase.execute().await.unwrap();

        assert_eq!(outcome, RunOutcome::CommitFailed { count: 1 });
        assert_eq!(ledger.save_count(), 1);
    }

    #[tokio::test]
    async fn 追記時に期限切れのエントリを刈り込む() {
        // 現在時刻 2025-01-05 に対して 2024-11-01 終了は 30 日超
        let ledger = InMemoryLedgerStore::with_keys(&["Old Game_2024-11-01T00:00:00.000Z"]);
        let usecase = make_usecase(
            MockCatalogClient::with_document(alan_wake_catalog()),
            ledger.clone(),
            MockNotificationSender::new(),
        );

        usecase.execute().await.unwrap();

        assert_eq!(
            ledger.document().unwrap().notified_games,
            vec![ALAN_WAKE_KEY.to_string()]
        );
    }

    #[tokio::test]
    async fn ドライランでは送信しても台帳を書き込まない() {
        let ledger = InMemoryLedgerStore::with_keys(&["Control_2025-01-02T00:00:00.000Z"]);
        let usecase = make_usecase_with_sender(
            MockCatalogClient::with_document(alan_wake_catalog()),
            ledger.clone(),
            Arc::new(NoopNotificationSender),
        )
        .dry_run(true);

        let outcome = usecase.execute().await.unwrap();

        assert_eq!(outcome, RunOutcome::DryRun { count: 1 });
        assert_eq!(ledger.save_count(), 0);
        assert_eq!(
            ledger.document().unwrap().notified_games,
            vec!["Control_2025-01-02T00:00:00.000Z".to_string()]
        );
    }

    #[tokio::test]
    async fn ドライランでも送信失敗はnotify_failedになる() {
        let ledger = InMemoryLedgerStore::new();
        let usecase = make_usecase(
            MockCatalogClient::with_document(alan_wake_catalog()),
            ledger.clone(),
            MockNotificationSender::failing(),
        )
        .dry_run(true);

        let outcome = usecase.execute().await.unwrap();

        assert_eq!(outcome, RunOutcome::NotifyFailed { count: 1 });
        assert_eq!(ledger.save_count(), 0);
    }
}
