//! # DocFlow ワークフローエンジン
//!
//! 文書承認ワークフローの実行を司るエンジン層。
//!
//! ## 責務
//!
//! - **インスタンス初期化**: 文書作成時に既定の定義からインスタンスを生成
//! - **遷移の検証と適用**: 定義・ロールガード・コメント必須の検証を経て、
//!   履歴の追記とステータス更新を単一トランザクションで実行
//! - **業務イベントログ**: 初期化・遷移の成否を構造化ログとして出力
//!
//! ## 設計方針
//!
//! エンジンはステートレスであり、呼び出しごとに必要な状態を
//! リポジトリから読み直す。並行する遷移要求の競合は、
//! インスタンスのバージョンによる楽観的ロックで検出する。
//!
//! ## 依存関係
//!
//! ```text
//! engine ─→ infra ─→ domain
//!    └─→ shared（業務イベントログ）
//! ```

mod document;
mod error;
mod service;

pub use document::WorkflowDocument;
pub use error::WorkflowError;
pub use service::{TransitionRequest, WorkflowService};
