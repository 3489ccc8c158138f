//! # DocFlow ドメイン層
//!
//! 承認ワークフローエンジンのドメインモデルを定義する。
//!
//! ## 概念モデル
//!
//! - **WorkflowDefinition**: 文書種別ごとに設定されたステートマシン定義
//!   （ステータスと遷移エッジの集合）
//! - **WorkflowInstance**: 1 件の業務文書のワークフロー進行状態
//! - **WorkflowHistoryEntry**: 適用された遷移の追記専用監査ログ
//!
//! ## 依存関係の方向
//!
//! ```text
//! engine → infra → domain
//! ```
//!
//! ドメイン層はインフラ層（DB、外部サービス）に一切依存しない。
//! 現在時刻も [`clock::Clock`] トレイト経由で注入され、
//! ビジネスロジックの純粋性が保たれる。
//!
//! ## 使用例
//!
//! ```rust
//! use docflow_domain::{
//!     DomainError,
//!     tenant::TenantId,
//!     value_objects::DocumentType,
//! };
//!
//! # fn main() -> Result<(), DomainError> {
//! let tenant_id = TenantId::new();
//! let document_type = DocumentType::new("purchase_order")?;
//! assert_eq!(document_type.as_str(), "purchase_order");
//! # Ok(())
//! # }
//! ```

#[macro_use]
mod macros;

pub mod actor;
pub mod clock;
pub mod error;
pub mod tenant;
pub mod value_objects;
pub mod workflow;

pub use error::DomainError;
