//! # WorkflowInstanceRepository
//!
//! ワークフローインスタンスの永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **テナント分離**: すべてのクエリでテナント ID を条件に含める
//! - **楽観的ロック**: 更新は期待バージョンとの一致を条件に行い、
//!   不一致（更新行数 0）を競合として報告する
//! - **重複防止**: `(tenant_id, document_type, document_id)` の一意制約に
//!   違反した INSERT を競合として報告する

use async_trait::async_trait;
use docflow_domain::{
    tenant::TenantId,
    value_objects::{DocumentType, StatusKey, Version},
    workflow::{
        DocumentId,
        WorkflowDefinitionId,
        WorkflowInstance,
        WorkflowInstanceId,
        WorkflowInstanceRecord,
    },
};
use sqlx::{PgPool, Row as _, postgres::PgRow};

use crate::{db::TxContext, error::InfraError};

/// ワークフローインスタンスリポジトリトレイト
#[async_trait]
pub trait WorkflowInstanceRepository: Send + Sync {
    /// インスタンスを新規作成する
    ///
    /// # 戻り値
    ///
    /// - `Err(InfraErrorKind::Conflict)`: 同じ文書のインスタンスが
    ///   既に存在する場合（一意制約違反）
    async fn insert(
        &self,
        tx: &mut TxContext,
        instance: &WorkflowInstance,
    ) -> Result<(), InfraError>;

    /// バージョン一致を条件にインスタンスを更新する
    ///
    /// `expected_version` は更新前スナップショットのバージョン。
    /// DB 上のバージョンと一致しない場合は何も更新せず競合を返す。
    ///
    /// # 戻り値
    ///
    /// - `Err(InfraErrorKind::Conflict)`: バージョン不一致（並行更新に敗北）
    async fn update_with_version_check(
        &self,
        tx: &mut TxContext,
        instance: &WorkflowInstance,
        expected_version: Version,
    ) -> Result<(), InfraError>;

    /// ID でインスタンスを取得する
    async fn find_by_id(
        &self,
        id: &WorkflowInstanceId,
        tenant_id: &TenantId,
    ) -> Result<Option<WorkflowInstance>, InfraError>;

    /// 文書への参照でインスタンスを取得する
    ///
    /// `(tenant_id, document_type, document_id)` ごとに高々 1 件であることは
    /// 一意制約で保証される。
    async fn find_by_document(
        &self,
        tenant_id: &TenantId,
        document_type: &DocumentType,
        document_id: &DocumentId,
    ) -> Result<Option<WorkflowInstance>, InfraError>;
}

/// PostgreSQL 実装の WorkflowInstanceRepository
#[derive(Debug, Clone)]
pub struct PostgresWorkflowInstanceRepository {
    pool: PgPool,
}

impl PostgresWorkflowInstanceRepository {
    /// 新しいリポジトリインスタンスを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_instance(row: &PgRow) -> Result<WorkflowInstance, InfraError> {
    let version: i32 = row.try_get("version")?;

    Ok(WorkflowInstance::from_db(WorkflowInstanceRecord {
        id: WorkflowInstanceId::from_uuid(row.try_get("id")?),
        tenant_id: TenantId::from_uuid(row.try_get("tenant_id")?),
        definition_id: WorkflowDefinitionId::from_uuid(row.try_get("definition_id")?),
        document_type: DocumentType::new(row.try_get::<String, _>("document_type")?)
            .map_err(|e| InfraError::unexpected(e.to_string()))?,
        document_id: DocumentId::from_uuid(row.try_get("document_id")?),
        current_status_key: StatusKey::new(row.try_get::<String, _>("current_status_key")?)
            .map_err(|e| InfraError::unexpected(e.to_string()))?,
        version: Version::try_from(version).map_err(|e| InfraError::unexpected(e.to_string()))?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    }))
}

#[async_trait]
impl WorkflowInstanceRepository for PostgresWorkflowInstanceRepository {
    async fn insert(
        &self,
        tx: &mut TxContext,
        instance: &WorkflowInstance,
    ) -> Result<(), InfraError> {
        let result = sqlx::query(
            r"
            INSERT INTO workflow_instances (
                id, tenant_id, definition_id, document_type, document_id,
                current_status_key, version, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(instance.id().as_uuid())
        .bind(instance.tenant_id().as_uuid())
        .bind(instance.definition_id().as_uuid())
        .bind(instance.document_type().as_str())
        .bind(instance.document_id().as_uuid())
        .bind(instance.current_status_key().as_str())
        .bind(instance.version().as_i32())
        .bind(instance.created_at())
        .bind(instance.updated_at())
        .execute(tx.conn())
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(ref db)) if db.is_unique_violation() => Err(
                InfraError::conflict("WorkflowInstance", instance.id().to_string()),
            ),
            Err(e) => Err(e.into()),
        }
    }

    async fn update_with_version_check(
        &self,
        tx: &mut TxContext,
        instance: &WorkflowInstance,
        expected_version: Version,
    ) -> Result<(), InfraError> {
        let result = sqlx::query(
            r"
            UPDATE workflow_instances
            SET current_status_key = $1, version = $2, updated_at = $3
            WHERE id = $4 AND tenant_id = $5 AND version = $6
            ",
        )
        .bind(instance.current_status_key().as_str())
        .bind(instance.version().as_i32())
        .bind(instance.updated_at())
        .bind(instance.id().as_uuid())
        .bind(instance.tenant_id().as_uuid())
        .bind(expected_version.as_i32())
        .execute(tx.conn())
        .await?;

        if result.rows_affected() == 0 {
            return Err(InfraError::conflict(
                "WorkflowInstance",
                instance.id().to_string(),
            ));
        }

        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &WorkflowInstanceId,
        tenant_id: &TenantId,
    ) -> Result<Option<WorkflowInstance>, InfraError> {
        let row = sqlx::query(
            r"
            SELECT
                id, tenant_id, definition_id, document_type, document_id,
                current_status_key, version, created_at, updated_at
            FROM workflow_instances
            WHERE id = $1 AND tenant_id = $2
            ",
        )
        .bind(id.as_uuid())
        .bind(tenant_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_instance).transpose()
    }

    async fn find_by_document(
        &self,
        tenant_id: &TenantId,
        document_type: &DocumentType,
        document_id: &DocumentId,
    ) -> Result<Option<WorkflowInstance>, InfraError> {
        let row = sqlx::query(
            r"
            SELECT
                id, tenant_id, definition_id, document_type, document_id,
                current_status_key, version, created_at, updated_at
            FROM workflow_instances
            WHERE tenant_id = $1 AND document_type = $2 AND document_id = $3
            ",
        )
        .bind(tenant_id.as_uuid())
        .bind(document_type.as_str())
        .bind(document_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_instance).transpose()
    }
}
