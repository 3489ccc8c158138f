//! # ワークフロー履歴
//!
//! 遷移の適用を記録する追記専用の監査レコード。
//! 作成後の更新・削除は行わず、インスタンスごとの履歴列が
//! 文書の承認経緯をそのまま表す。
//!
//! ## 設計方針
//!
//! 遷移ラベルは定義から非正規化して保持する。定義が後から編集・無効化
//! されても、履歴の表示が当時の内容のまま再現できるようにするため。

use chrono::{DateTime, Utc};

use crate::{
    actor::UserId,
    tenant::TenantId,
    value_objects::{StatusKey, TransitionComment},
    workflow::instance::WorkflowInstanceId,
};

define_uuid_id! {
    /// ワークフロー履歴エントリ ID
    ///
    /// UUID v7 のため、生成順がそのまま時系列順になる。
    pub struct WorkflowHistoryId;
}

/// ワークフロー履歴エントリ
///
/// 1 回の遷移適用につき 1 件、インスタンスの更新と同一トランザクションで
/// 記録される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowHistoryEntry {
    id: WorkflowHistoryId,
    instance_id: WorkflowInstanceId,
    tenant_id: TenantId,
    from_status_key: StatusKey,
    to_status_key: StatusKey,
    transition_label: String,
    actor_id: UserId,
    comment: Option<TransitionComment>,
    created_at: DateTime<Utc>,
}

/// ワークフロー履歴エントリの新規作成パラメータ
pub struct NewWorkflowHistoryEntry {
    pub id: WorkflowHistoryId,
    pub instance_id: WorkflowInstanceId,
    pub tenant_id: TenantId,
    pub from_status_key: StatusKey,
    pub to_status_key: StatusKey,
    pub transition_label: String,
    pub actor_id: UserId,
    pub comment: Option<TransitionComment>,
    pub now: DateTime<Utc>,
}

/// ワークフロー履歴エントリの DB 復元パラメータ
pub struct WorkflowHistoryRecord {
    pub id: WorkflowHistoryId,
    pub instance_id: WorkflowInstanceId,
    pub tenant_id: TenantId,
    pub from_status_key: StatusKey,
    pub to_status_key: StatusKey,
    pub transition_label: String,
    pub actor_id: UserId,
    pub comment: Option<TransitionComment>,
    pub created_at: DateTime<Utc>,
}

impl WorkflowHistoryEntry {
    /// 新しい履歴エントリを作成する
    pub fn new(params: NewWorkflowHistoryEntry) -> Self {
        Self {
            id: params.id,
            instance_id: params.instance_id,
            tenant_id: params.tenant_id,
            from_status_key: params.from_status_key,
            to_status_key: params.to_status_key,
            transition_label: params.transition_label,
            actor_id: params.actor_id,
            comment: params.comment,
            created_at: params.now,
        }
    }

    /// 既存のデータから復元する
    pub fn from_db(record: WorkflowHistoryRecord) -> Self {
        Self {
            id: record.id,
            instance_id: record.instance_id,
            tenant_id: record.tenant_id,
            from_status_key: record.from_status_key,
            to_status_key: record.to_status_key,
            transition_label: record.transition_label,
            actor_id: record.actor_id,
            comment: record.comment,
            created_at: record.created_at,
        }
    }

    // Getter メソッド

    pub fn id(&self) -> &WorkflowHistoryId {
        &self.id
    }

    pub fn instance_id(&self) -> &WorkflowInstanceId {
        &self.instance_id
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    pub fn from_status_key(&self) -> &StatusKey {
        &self.from_status_key
    }

    pub fn to_status_key(&self) -> &StatusKey {
        &self.to_status_key
    }

    pub fn transition_label(&self) -> &str {
        &self.transition_label
    }

    pub fn actor_id(&self) -> &UserId {
        &self.actor_id
    }

    pub fn comment(&self) -> Option<&TransitionComment> {
        self.comment.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
