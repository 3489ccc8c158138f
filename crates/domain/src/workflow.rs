//! # ワークフロー
//!
//! 文書種別ごとに設定される承認ワークフローのドメインモデル。
//!
//! ## 概念モデル
//!
//! - **WorkflowDefinition**: ステータスと遷移エッジの集合からなる
//!   ステートマシン定義（実行中は読み取り専用）
//! - **WorkflowInstance**: 1 件の業務文書の進行状態
//!   （現在ステータスキーと楽観的ロック用バージョン）
//! - **WorkflowHistoryEntry**: 適用された遷移の追記専用レコード
//!
//! ## 不変条件
//!
//! - インスタンスの `current_status_key` は、最新の履歴エントリの
//!   `to_status_key`（履歴が空なら定義の初期ステータス）と常に一致する
//! - 遷移が合法なのは、定義上のエッジの `from_status_key` が現在
//!   ステータスと一致し、かつロールガードが満たされる場合のみ
//!
//! ## 使用例
//!
//! ```rust
//! # fn main() -> Result<(), docflow_domain::DomainError> {
//! use docflow_domain::{
//!     actor::UserId,
//!     tenant::TenantId,
//!     value_objects::{DocumentType, StatusKey, WorkflowName},
//!     workflow::{
//!         NewWorkflowDefinition, WorkflowDefinition, WorkflowDefinitionId, WorkflowStatus,
//!     },
//! };
//!
//! let definition = WorkflowDefinition::new(NewWorkflowDefinition {
//!     id:            WorkflowDefinitionId::new(),
//!     tenant_id:     TenantId::new(),
//!     document_type: DocumentType::new("purchase_order")?,
//!     name:          WorkflowName::new("発注承認")?,
//!     is_active:     true,
//!     is_default:    true,
//!     statuses:      vec![WorkflowStatus::new(
//!         StatusKey::new("draft")?,
//!         "下書き",
//!         "gray",
//!         true,
//!     )],
//!     transitions:   Vec::new(),
//!     created_by:    UserId::new(),
//!     now:           chrono::Utc::now(),
//! })?;
//! assert_eq!(definition.initial_status().key().as_str(), "draft");
//! # Ok(())
//! # }
//! ```

mod definition;
mod definition_validator;
mod history;
mod instance;

pub use definition::*;
pub use definition_validator::*;
pub use history::*;
pub use instance::*;
