//! # WorkflowHistoryRepository
//!
//! ワークフロー履歴の永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **追記専用**: INSERT と読み取りのみを提供し、更新・削除は定義しない
//! - **時系列順**: 履歴 ID は UUID v7 のため、ID 順がそのまま適用順になる
//! - **テナント分離**: すべてのクエリでテナント ID を条件に含める

use async_trait::async_trait;
use docflow_domain::{
    actor::UserId,
    tenant::TenantId,
    value_objects::{StatusKey, TransitionComment},
    workflow::{
        WorkflowHistoryEntry,
        WorkflowHistoryId,
        WorkflowHistoryRecord,
        WorkflowInstanceId,
    },
};
use sqlx::{PgPool, Row as _, postgres::PgRow};

use crate::{db::TxContext, error::InfraError};

/// ワークフロー履歴リポジトリトレイト
#[async_trait]
pub trait WorkflowHistoryRepository: Send + Sync {
    /// 履歴エントリを追記する
    async fn insert(
        &self,
        tx: &mut TxContext,
        entry: &WorkflowHistoryEntry,
    ) -> Result<(), InfraError>;

    /// インスタンスの履歴を適用順（古い順）に取得する
    async fn find_by_instance(
        &self,
        instance_id: &WorkflowInstanceId,
        tenant_id: &TenantId,
    ) -> Result<Vec<WorkflowHistoryEntry>, InfraError>;
}

/// PostgreSQL 実装の WorkflowHistoryRepository
#[derive(Debug, Clone)]
pub struct PostgresWorkflowHistoryRepository {
    pool: PgPool,
}

impl PostgresWorkflowHistoryRepository {
    /// 新しいリポジトリインスタンスを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_entry(row: &PgRow) -> Result<WorkflowHistoryEntry, InfraError> {
    Ok(WorkflowHistoryEntry::from_db(WorkflowHistoryRecord {
        id: WorkflowHistoryId::from_uuid(row.try_get("id")?),
        instance_id: WorkflowInstanceId::from_uuid(row.try_get("instance_id")?),
        tenant_id: TenantId::from_uuid(row.try_get("tenant_id")?),
        from_status_key: StatusKey::new(row.try_get::<String, _>("from_status_key")?)
            .map_err(|e| InfraError::unexpected(e.to_string()))?,
        to_status_key: StatusKey::new(row.try_get::<String, _>("to_status_key")?)
            .map_err(|e| InfraError::unexpected(e.to_string()))?,
        transition_label: row.try_get("transition_label")?,
        actor_id: UserId::from_uuid(row.try_get("actor_id")?),
        comment: TransitionComment::from_input(row.try_get::<Option<String>, _>("comment")?),
        created_at: row.try_get("created_at")?,
    }))
}

#[async_trait]
impl WorkflowHistoryRepository for PostgresWorkflowHistoryRepository {
    async fn insert(
        &self,
        tx: &mut TxContext,
        entry: &WorkflowHistoryEntry,
    ) -> Result<(), InfraError> {
        sqlx::query(
            r"
            INSERT INTO workflow_histories (
                id, instance_id, tenant_id, from_status_key, to_status_key,
                transition_label, actor_id, comment, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(entry.id().as_uuid())
        .bind(entry.instance_id().as_uuid())
        .bind(entry.tenant_id().as_uuid())
        .bind(entry.from_status_key().as_str())
        .bind(entry.to_status_key().as_str())
        .bind(entry.transition_label())
        .bind(entry.actor_id().as_uuid())
        .bind(entry.comment().map(|c| c.as_str().to_string()))
        .bind(entry.created_at())
        .execute(tx.conn())
        .await?;

        Ok(())
    }

    async fn find_by_instance(
        &self,
        instance_id: &WorkflowInstanceId,
        tenant_id: &TenantId,
    ) -> Result<Vec<WorkflowHistoryEntry>, InfraError> {
        let rows = sqlx::query(
            r"
            SELECT
                id, instance_id, tenant_id, from_status_key, to_status_key,
                transition_label, actor_id, comment, created_at
            FROM workflow_histories
            WHERE instance_id = $1 AND tenant_id = $2
            ORDER BY id
            ",
        )
        .bind(instance_id.as_uuid())
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_entry).collect()
    }
}
