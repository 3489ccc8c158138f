//! # エンジン層エラー定義
//!
//! 遷移要求の検証で発生する業務エラーと、下位層のエラーの変換を定義する。
//!
//! ## 設計方針
//!
//! 検証エラー（IllegalTransition / Forbidden / CommentRequired）は
//! 利用者に提示して操作のやり直しを促すエラーであり、リトライしない。
//! ConcurrentModification は「最新の状態を取得して再操作」を促す。

use docflow_domain::DomainError;
use docflow_infra::InfraError;
use thiserror::Error;

/// ワークフローエンジンで発生するエラー
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// リソースが見つからない
    ///
    /// インスタンス・定義・遷移が存在しない、または別テナントに属する場合。
    #[error("リソースが見つかりません: {0}")]
    NotFound(String),

    /// 不正な遷移
    ///
    /// 遷移の遷移元ステータスがインスタンスの現在ステータスと一致しない場合。
    #[error("現在のステータスからは実行できない操作です: {0}")]
    IllegalTransition(String),

    /// 権限不足
    ///
    /// 遷移のロールガードを操作者が満たさない場合。
    #[error("この操作を行う権限がありません: {0}")]
    Forbidden(String),

    /// コメント必須
    ///
    /// コメント必須の遷移にコメントなし（または空白のみ）で要求した場合。
    #[error("この操作にはコメントが必要です: {0}")]
    CommentRequired(String),

    /// インスタンスの重複
    ///
    /// 同じ文書に対して初期化が二重に行われた場合。
    #[error("この文書のワークフローは既に開始されています: {0}")]
    DuplicateInstance(String),

    /// 並行更新の競合
    ///
    /// 別の操作が先にステータスを更新した場合（楽観的ロック失敗）。
    /// 最新の状態を取得してから再操作する必要がある。
    #[error("ワークフローは既に更新されています。最新の情報を取得してください。")]
    ConcurrentModification,

    /// ドメイン層エラー
    #[error("ドメインエラー: {0}")]
    Domain(#[from] DomainError),

    /// インフラ層エラー
    #[error("データベースエラー: {0}")]
    Infra(#[from] InfraError),
}
