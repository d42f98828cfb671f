//! # 台帳ストア
//!
//! 通知済み識別子の台帳を JSON ファイルに永続化する。
//!
//! ## ファイル形式
//!
//! ```json
//! {
//!   "notified_games": [
//!     "Alan Wake_2025-01-08T00:00:00.000Z"
//!   ]
//! }
//! ```
//!
//! ## 設計方針
//!
//! - **ファイルが無ければ空の台帳**: 初回実行時はエラーにしない
//! - **破損はエラーとして返す**: 空の台帳として続行するかは呼び出し側が判断する
//! - **一時ファイル + fsync + rename で書き込む**: 書き込み途中でプロセスや電源が落ちても、
//!   台帳は旧内容か新内容のどちらかになる
//! - **ロックなし**: 同一ファイルに対する同時実行は想定しない

use std::{
    ffi::OsString,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use freegames_domain::ledger::{LedgerDocument, LedgerState};
use tokio::io::AsyncWriteExt as _;

use crate::error::InfraError;

/// 台帳ファイルの既定パス
pub const DEFAULT_LEDGER_PATH: &str = "notified_games.json";

/// 台帳ストアトレイト
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// 台帳を読み込む（未作成の場合は空）
    async fn load(&self) -> Result<LedgerState, InfraError>;

    /// 台帳全体を書き込む
    async fn save(&self, state: &LedgerState) -> Result<(), InfraError>;
}

/// JSON ファイルによる台帳ストア
#[derive(Debug, Clone)]
pub struct JsonFileLedgerStore {
    path: PathBuf,
}

impl JsonFileLedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 書き込み用の一時ファイルパス（同じディレクトリに置き rename を原子的にする）
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from(DEFAULT_LEDGER_PATH));
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl LedgerStore for JsonFileLedgerStore {
    #[tracing::instrument(skip_all, level = "debug", fields(path = %self.path.display()))]
    async fn load(&self) -> Result<LedgerState, InfraError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("台帳ファイルが無いため空の台帳で開始します");
                return Ok(LedgerState::new());
            }
            Err(e) => return Err(e.into()),
        };

        let document: LedgerDocument = serde_json::from_slice(&bytes)?;
        Ok(LedgerState::from_document(document))
    }

    #[tracing::instrument(skip_all, level = "debug", fields(path = %self.path.display()))]
    async fn save(&self, state: &LedgerState) -> Result<(), InfraError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut bytes = serde_json::to_vec_pretty(&state.to_document())?;
        bytes.push(b'\n');

        let temp_path = self.temp_path();
        let mut file = tokio::fs::File::create(&temp_path).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&temp_path, &self.path).await?;

        tracing::debug!(entries = state.len(), "台帳を書き込みました");
        Ok(())
    }
}
