//! # FreeGames Notifier
//!
//! ストアの無料配布タイトルを確認し、未通知のものをメールで知らせるバッチ。
//!
//! 1 回の起動で 0 通または 1 通のメールを送って終了する。
//! 定期実行（cron、CI のスケジュール等）から起動する前提で、同時実行は想定しない。
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `SMTP_SERVER` | **Yes** | SMTP サーバーのホスト名 |
//! | `SMTP_PORT` | **Yes** | SMTP ポート番号（STARTTLS） |
//! | `EMAIL` | **Yes** | SMTP ログインユーザー |
//! | `PASSWORD` | **Yes** | SMTP ログインパスワード |
//! | `FROM_EMAIL` | **Yes** | 送信元メールアドレス |
//! | `TO_EMAIL` | **Yes** | 送信先メールアドレス |
//! | `LEDGER_PATH` | No | 台帳ファイル（デフォルト: `notified_games.json`） |
//! | `CATALOG_URL` | No | カタログ API の URL |
//! | `HTTP_TIMEOUT_SECS` | No | カタログ取得のタイムアウト秒（デフォルト: 30） |
//! | `SMTP_TIMEOUT_SECS` | No | SMTP のタイムアウト秒（デフォルト: 30） |
//! | `NOTIFICATION_BACKEND` | No | `smtp`（デフォルト）または `noop`（ドライラン。台帳は更新しない） |
//! | `LOG_FORMAT` | No | `pretty`（デフォルト）または `json` |
//!
//! ## 終了コード
//!
//! - `0`: 通知成功、未通知なし、または通知失敗（警告ログのみ）
//! - `1`: 設定不正、カタログ取得失敗、カタログ形式不正
//!
//! ## 起動方法
//!
//! ```bash
//! # ドライラン（メールを送らずログに出し、台帳も更新しない）
//! NOTIFICATION_BACKEND=noop cargo run -p freegames-notifier
//! ```

use std::sync::Arc;

use anyhow::Context as _;
use freegames_domain::clock::SystemClock;
use freegames_infra::{
    catalog_client::HttpCatalogClient,
    ledger_store::JsonFileLedgerStore,
    notification::{
        NoopNotificationSender,
        NotificationSender,
        SmtpNotificationSender,
        SmtpSettings,
    },
};
use freegames_notifier::{
    config::{NotificationBackend, NotificationConfig, NotifierConfig},
    usecase::{CheckFreeGamesUseCase, NotificationService, TemplateRenderer},
};
use freegames_shared::observability::{TracingConfig, init_tracing};
use tracing::Instrument as _;

const APP_NAME: &str = "free-games-notifier";

/// エントリーポイント
///
/// 各ステージは順に 1 つずつ実行するため、シングルスレッドのランタイムで動かす。
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    let root_span = init_tracing(TracingConfig::from_env(APP_NAME));

    run().instrument(root_span).await
}

async fn run() -> anyhow::Result<()> {
    // ネットワークに触れる前に設定を検証する
    let config = NotifierConfig::from_env().context("設定の読み込みに失敗しました")?;
    tracing::debug!(?config, "設定を読み込みました");

    let catalog_client = HttpCatalogClient::new(&config.catalog_url, config.http_timeout)
        .context("HTTP クライアントの初期化に失敗しました")?;
    let ledger_store = JsonFileLedgerStore::new(&config.ledger_path);
    let sender = build_sender(&config.notification)?;
    let notifier = NotificationService::new(
        sender,
        TemplateRenderer::new().context("テンプレートの読み込みに失敗しました")?,
        config.notification.to_address.clone(),
    );

    let usecase = CheckFreeGamesUseCase::new(
        Arc::new(catalog_client),
        Arc::new(ledger_store),
        notifier,
        Arc::new(SystemClock),
    )
    .dry_run(config.notification.backend == NotificationBackend::Noop);

    let outcome = usecase.execute().await?;
    tracing::info!(?outcome, "実行が完了しました");
    Ok(())
}

/// 設定に応じた送信バックエンドを組み立てる
fn build_sender(config: &NotificationConfig) -> anyhow::Result<Arc<dyn NotificationSender>> {
    match config.backend {
        NotificationBackend::Smtp => {
            let sender = SmtpNotificationSender::new(SmtpSettings {
                host:         config.smtp_server.clone(),
                port:         config.smtp_port,
                username:     config.login.clone(),
                password:     config.password.clone(),
                from_address: config.from_address.clone(),
                timeout:      config.smtp_timeout,
            })
            .context("SMTP 送信の初期化に失敗しました")?;
            tracing::info!(
                host = %config.smtp_server,
                port = config.smtp_port,
                "SMTP で通知します"
            );
            Ok(Arc::new(sender))
        }
        NotificationBackend::Noop => {
            tracing::info!("NOTIFICATION_BACKEND=noop のためメール送信と台帳の更新を行いません");
            Ok(Arc::new(NoopNotificationSender))
        }
    }
}
