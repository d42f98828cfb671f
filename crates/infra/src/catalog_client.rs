//! # カタログ API クライアント
//!
//! ストアの `freeGamesPromotions` エンドポイントから現在のカタログを取得する。
//!
//! ## 設計方針
//!
//! - **1 回の GET のみ**: リトライは行わない。失敗はその実行全体の失敗として扱う
//! - **タイムアウト必須**: 定期実行が次回起動と重ならないよう、リクエスト全体に上限を設ける
//! - **trait による抽象化**: ユースケースのテストではスタブに差し替える

use std::time::Duration;

use async_trait::async_trait;
use freegames_domain::catalog::CatalogDocument;

use crate::error::InfraError;

/// カタログ API の既定エンドポイント
pub const DEFAULT_CATALOG_URL: &str =
    "https://store-site-backend-static.ak.epicgames.com/freeGamesPromotions";

/// カタログ取得トレイト
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// 現在のプロモーションカタログを取得する
    ///
    /// 2xx 以外のステータス、通信エラー、JSON として解釈できないボディはエラー。
    async fn fetch(&self) -> Result<CatalogDocument, InfraError>;
}

/// reqwest による HTTP 実装
pub struct HttpCatalogClient {
    url:    String,
    client: reqwest::Client,
}

impl HttpCatalogClient {
    /// 新しいクライアントを作成する
    ///
    /// # 引数
    ///
    /// - `url`: カタログ API の URL（通常は [`DEFAULT_CATALOG_URL`]）
    /// - `timeout`: 接続からボディ受信完了までの上限
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, InfraError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    #[tracing::instrument(skip_all, level = "debug", fields(url = %self.url))]
    async fn fetch(&self) -> Result<CatalogDocument, InfraError> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(InfraError::http_status(status.as_u16()));
        }

        let document = response.json::<CatalogDocument>().await?;
        tracing::debug!("カタログを取得しました");
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    use super::*;
    use crate::error::InfraErrorKind;

    /// 1 回だけ固定レスポンスを返すローカル HTTP サーバーを起動し、その URL を返す
    async fn serve_once(status_line: &'static str, body: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await.unwrap();
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{addr}/freeGamesPromotions")
    }

    fn make_client(url: &str) -> HttpCatalogClient {
        HttpCatalogClient::new(url, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HttpCatalogClient>();
    }

    #[tokio::test]
    async fn 成功レスポンスのjsonを返す() {
        let body = json!({ "data": { "Catalog": { "searchStore": { "elements": [] } } } });
        let url = serve_once("200 OK", body.to_string()).await;

        let document = make_client(&url).fetch().await.unwrap();

        assert_eq!(document, body);
    }

    #[tokio::test]
    async fn 成功以外のステータスはhttp_statusエラーになる() {
        let url = serve_once("503 Service Unavailable", "{}".to_string()).await;

        let err = make_client(&url).fetch().await.unwrap_err();

        assert!(matches!(
            err.kind(),
            InfraErrorKind::HttpStatus { status: 503 }
        ));
    }

    #[tokio::test]
    async fn jsonとして解釈できないボディはhttpエラーになる() {
        let url = serve_once("200 OK", "<html>maintenance</html>".to_string()).await;

        let err = make_client(&url).fetch().await.unwrap_err();

        assert!(matches!(err.kind(), InfraErrorKind::Http(_)));
    }
}
