//! # リポジトリ実装
//!
//! ワークフロー定義・インスタンス・履歴の永続化操作を提供する。
//!
//! ## 設計方針
//!
//! - **トレイトと実装の分離**: エンジン層はトレイトにのみ依存し、
//!   Postgres 実装とテスト用 Mock 実装を差し替えられる
//! - **テナント分離**: すべてのメソッドがテナント ID を明示的な引数に取る
//! - **書き込みの構造的強制**: 書き込みメソッドは [`TxContext`](crate::db::TxContext)
//!   を必須引数とし、トランザクション外の書き込みをコンパイルエラーにする

mod workflow_definition_repository;
mod workflow_history_repository;
mod workflow_instance_repository;

pub use workflow_definition_repository::{
    PostgresWorkflowDefinitionRepository,
    WorkflowDefinitionRepository,
};
pub use workflow_history_repository::{
    PostgresWorkflowHistoryRepository,
    WorkflowHistoryRepository,
};
pub use workflow_instance_repository::{
    PostgresWorkflowInstanceRepository,
    WorkflowInstanceRepository,
};
