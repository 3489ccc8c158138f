//! # WorkflowDefinitionRepository
//!
//! ワークフロー定義の永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **集約単位の入出力**: 定義・ステータス・遷移の 3 テーブルを
//!   常にまとめて読み書きし、部分的な定義がエンジンに渡らないようにする
//! - **定義順の保持**: `sort_order` 列でステータス・遷移の定義順を保持する
//! - **テナント分離**: すべてのクエリでテナント ID を条件に含める

use async_trait::async_trait;
use docflow_domain::{
    actor::UserId,
    tenant::TenantId,
    value_objects::{DocumentType, RoleKey, StatusKey, WorkflowName},
    workflow::{
        WorkflowDefinition,
        WorkflowDefinitionId,
        WorkflowDefinitionRecord,
        WorkflowStatus,
        WorkflowTransition,
        WorkflowTransitionId,
    },
};
use sqlx::{PgPool, Row as _, postgres::PgRow};
use uuid::Uuid;

use crate::{db::TxContext, error::InfraError};

/// ワークフロー定義リポジトリトレイト
///
/// 定義は管理者の設定操作でのみ書き込まれ、エンジンからは読み取り専用。
#[async_trait]
pub trait WorkflowDefinitionRepository: Send + Sync {
    /// 定義を保存する（ステータス・遷移を含む集約全体）
    ///
    /// # 戻り値
    ///
    /// - `Err(InfraErrorKind::Conflict)`: 同一テナント・文書種別に
    ///   既定かつ有効な定義が既に存在する場合（部分一意索引違反）
    async fn insert(
        &self,
        tx: &mut TxContext,
        definition: &WorkflowDefinition,
    ) -> Result<(), InfraError>;

    /// ID で定義を取得する
    async fn find_by_id(
        &self,
        id: &WorkflowDefinitionId,
        tenant_id: &TenantId,
    ) -> Result<Option<WorkflowDefinition>, InfraError>;

    /// 文書種別の既定かつ有効な定義を取得する
    ///
    /// インスタンス初期化時の定義解決に使用する。
    /// `(tenant_id, document_type)` ごとに高々 1 件であることは
    /// 部分一意索引で保証される。
    async fn find_default_active(
        &self,
        tenant_id: &TenantId,
        document_type: &DocumentType,
    ) -> Result<Option<WorkflowDefinition>, InfraError>;
}

/// PostgreSQL 実装の WorkflowDefinitionRepository
#[derive(Debug, Clone)]
pub struct PostgresWorkflowDefinitionRepository {
    pool: PgPool,
}

impl PostgresWorkflowDefinitionRepository {
    /// 新しいリポジトリインスタンスを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 定義行にステータス・遷移を合流させて集約を復元する
    async fn hydrate(&self, row: &PgRow) -> Result<WorkflowDefinition, InfraError> {
        let definition_id: Uuid = row.try_get("id")?;

        let status_rows = sqlx::query(
            r"
            SELECT status_key, label, color, is_initial
            FROM workflow_statuses
            WHERE definition_id = $1
            ORDER BY sort_order
            ",
        )
        .bind(definition_id)
        .fetch_all(&self.pool)
        .await?;

        let statuses = status_rows
            .iter()
            .map(row_to_status)
            .collect::<Result<Vec<_>, InfraError>>()?;

        let transition_rows = sqlx::query(
            r"
            SELECT id, from_status_key, to_status_key, label, required_role, requires_comment
            FROM workflow_transitions
            WHERE definition_id = $1
            ORDER BY sort_order
            ",
        )
        .bind(definition_id)
        .fetch_all(&self.pool)
        .await?;

        let transitions = transition_rows
            .iter()
            .map(row_to_transition)
            .collect::<Result<Vec<_>, InfraError>>()?;

        let definition = WorkflowDefinition::from_db(WorkflowDefinitionRecord {
            id:            WorkflowDefinitionId::from_uuid(definition_id),
            tenant_id:     TenantId::from_uuid(row.try_get("tenant_id")?),
            document_type: DocumentType::new(row.try_get::<String, _>("document_type")?)
                .map_err(|e| InfraError::unexpected(e.to_string()))?,
            name:          WorkflowName::new(row.try_get::<String, _>("name")?)
                .map_err(|e| InfraError::unexpected(e.to_string()))?,
            is_active:     row.try_get("is_active")?,
            is_default:    row.try_get("is_default")?,
            statuses,
            transitions,
            created_by:    UserId::from_uuid(row.try_get("created_by")?),
            created_at:    row.try_get("created_at")?,
            updated_at:    row.try_get("updated_at")?,
        })
        .map_err(|e| InfraError::unexpected(e.to_string()))?;

        Ok(definition)
    }
}

fn row_to_status(row: &PgRow) -> Result<WorkflowStatus, InfraError> {
    Ok(WorkflowStatus::new(
        StatusKey::new(row.try_get::<String, _>("status_key")?)
            .map_err(|e| InfraError::unexpected(e.to_string()))?,
        row.try_get::<String, _>("label")?,
        row.try_get::<String, _>("color")?,
        row.try_get("is_initial")?,
    ))
}

fn row_to_transition(row: &PgRow) -> Result<WorkflowTransition, InfraError> {
    let required_role = row
        .try_get::<Option<String>, _>("required_role")?
        .map(RoleKey::new)
        .transpose()
        .map_err(|e| InfraError::unexpected(e.to_string()))?;

    Ok(WorkflowTransition::new(
        WorkflowTransitionId::from_uuid(row.try_get("id")?),
        StatusKey::new(row.try_get::<String, _>("from_status_key")?)
            .map_err(|e| InfraError::unexpected(e.to_string()))?,
        StatusKey::new(row.try_get::<String, _>("to_status_key")?)
            .map_err(|e| InfraError::unexpected(e.to_string()))?,
        row.try_get::<String, _>("label")?,
        required_role,
        row.try_get("requires_comment")?,
    ))
}

#[async_trait]
impl WorkflowDefinitionRepository for PostgresWorkflowDefinitionRepository {
    async fn insert(
        &self,
        tx: &mut TxContext,
        definition: &WorkflowDefinition,
    ) -> Result<(), InfraError> {
        let result = sqlx::query(
            r"
            INSERT INTO workflow_definitions (
                id, tenant_id, document_type, name,
                is_active, is_default, created_by,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(definition.id().as_uuid())
        .bind(definition.tenant_id().as_uuid())
        .bind(definition.document_type().as_str())
        .bind(definition.name().as_str())
        .bind(definition.is_active())
        .bind(definition.is_default())
        .bind(definition.created_by().as_uuid())
        .bind(definition.created_at())
        .bind(definition.updated_at())
        .execute(tx.conn())
        .await;

        if let Err(e) = result {
            return Err(match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    InfraError::conflict("WorkflowDefinition", definition.id().to_string())
                }
                _ => e.into(),
            });
        }

        for (sort_order, status) in definition.statuses().iter().enumerate() {
            sqlx::query(
                r"
                INSERT INTO workflow_statuses (
                    definition_id, status_key, label, color, is_initial, sort_order
                )
                VALUES ($1, $2, $3, $4, $5, $6)
                ",
            )
            .bind(definition.id().as_uuid())
            .bind(status.key().as_str())
            .bind(status.label())
            .bind(status.color())
            .bind(status.is_initial())
            .bind(sort_order as i32)
            .execute(tx.conn())
            .await?;
        }

        for (sort_order, transition) in definition.transitions().iter().enumerate() {
            sqlx::query(
                r"
                INSERT INTO workflow_transitions (
                    id, definition_id, from_status_key, to_status_key,
                    label, required_role, requires_comment, sort_order
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ",
            )
            .bind(transition.id().as_uuid())
            .bind(definition.id().as_uuid())
            .bind(transition.from_status_key().as_str())
            .bind(transition.to_status_key().as_str())
            .bind(transition.label())
            .bind(transition.required_role().map(|r| r.as_str().to_string()))
            .bind(transition.requires_comment())
            .bind(sort_order as i32)
            .execute(tx.conn())
            .await?;
        }

        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &WorkflowDefinitionId,
        tenant_id: &TenantId,
    ) -> Result<Option<WorkflowDefinition>, InfraError> {
        let row = sqlx::query(
            r"
            SELECT
                id, tenant_id, document_type, name,
                is_active, is_default, created_by,
                created_at, updated_at
            FROM workflow_definitions
            WHERE id = $1 AND tenant_id = $2
            ",
        )
        .bind(id.as_uuid())
        .bind(tenant_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(self.hydrate(&row).await?))
    }

    async fn find_default_active(
        &self,
        tenant_id: &TenantId,
        document_type: &DocumentType,
    ) -> Result<Option<WorkflowDefinition>, InfraError> {
        let row = sqlx::query(
            r"
            SELECT
                id, tenant_id, document_type, name,
                is_active, is_default, created_by,
                created_at, updated_at
            FROM workflow_definitions
            WHERE tenant_id = $1 AND document_type = $2
              AND is_default AND is_active
            ",
        )
        .bind(tenant_id.as_uuid())
        .bind(document_type.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(self.hydrate(&row).await?))
    }
}
