//! # ドメイン層エラー定義
//!
//! ビジネスルール違反やドメイン固有の例外状態を表現するエラー型。
//!
//! ## 設計方針
//!
//! - **型による分類**: エラーの種類を列挙型で明示し、パターンマッチで処理可能に
//! - **thiserror 活用**: `#[error(...)]` マクロでエラーメッセージを自動生成
//! - **上位層での変換**: エンジン層がこのエラーを受け取り、
//!   ワークフロー固有のエラー分類（遷移不正・権限不足など）に変換する

use thiserror::Error;

/// ドメイン層で発生するエラー
///
/// ビジネスロジックの実行中に発生する例外状態を表現する。
#[derive(Debug, Error)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// 入力値または設定がビジネスルールに違反している場合に使用する。
    /// 例: 空のステータスキー、初期ステータスを持たないワークフロー定義。
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    /// エンティティが見つからない
    ///
    /// `entity_type` にはエンティティの種類
    /// （"WorkflowDefinition", "WorkflowInstance" など）を指定する。
    #[error("{entity_type} が見つかりません: {id}")]
    NotFound {
        /// エンティティの種類（コンパイル時に決定される `&'static str`）
        entity_type: &'static str,
        /// 検索に使用した識別子
        id:          String,
    },

    /// 競合エラー（楽観的ロック失敗など）
    ///
    /// 同一インスタンスへの並行遷移でバージョンチェックが失敗した場合など。
    /// クライアントは最新状態を再取得してから操作をやり直す必要がある。
    #[error("競合が発生しました: {0}")]
    Conflict(String),

    /// 権限エラー
    ///
    /// 操作者のロールが遷移のロールガードを満たさない場合に使用する。
    /// 認証（401）ではなく認可（403）の失敗を表す。
    #[error("権限がありません: {0}")]
    Forbidden(String),
}
