//! # ビジネスイベントログの構造化ヘルパー
//!
//! 運用調査時に `jq` で効率的にフィルタできるよう、ログフィールドの命名規約と
//! ヘルパーマクロを提供する。
//!
//! ## ビジネスイベント
//!
//! [`log_business_event!`] マクロで出力する。`event.kind = "business_event"` マーカーが
//! 自動付与され、`jq 'select(.["event.kind"] == "business_event")'` でフィルタできる。
//!
//! ## フィールド命名規約
//!
//! ドット記法（`event.category`、`event.action`）を使用。tracing の
//! `$($field:ident).+` パターンでサポートされ、JSON 出力でフラットなキーになる。

/// ビジネスイベントを構造化ログとして出力する。
///
/// `event.kind = "business_event"` マーカーを自動付与し、
/// `tracing::info!` レベルで出力する。
///
/// ## 必須フィールド（慣例）
///
/// - `event.category`: イベントカテゴリ（[`event::category`] の定数を使用）
/// - `event.action`: アクション名（[`event::action`] の定数を使用）
/// - `event.tenant_id`: テナント ID
/// - `event.result`: 結果（[`event::result`] の定数を使用）
///
/// ## 推奨フィールド
///
/// - `event.entity_type`: エンティティ種別（[`event::entity_type`] の定数を使用）
/// - `event.entity_id`: エンティティ ID
/// - `event.actor_id`: 操作者 ID
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(
            event.kind = "business_event",
            $($args)*
        )
    };
}

/// イベントフィールドの定数
pub mod event {
    /// イベントカテゴリ
    pub mod category {
        pub const WORKFLOW: &str = "workflow";
    }

    /// イベントアクション
    pub mod action {
        pub const INSTANCE_INITIALISED: &str = "workflow.instance_initialised";
        pub const TRANSITION_APPLIED: &str = "workflow.transition_applied";
        pub const TRANSITION_REJECTED: &str = "workflow.transition_rejected";
    }

    /// エンティティ種別
    pub mod entity_type {
        pub const WORKFLOW_DEFINITION: &str = "workflow_definition";
        pub const WORKFLOW_INSTANCE: &str = "workflow_instance";
        pub const WORKFLOW_HISTORY: &str = "workflow_history";
    }

    /// イベント結果
    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const FAILURE: &str = "failure";
    }
}
