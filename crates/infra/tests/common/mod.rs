//! 統合テスト共通ヘルパー
//!
//! 各テストは `sqlx::test` によりマイグレーション適用済みの
//! 独立したデータベースを受け取るため、テナント・定義は
//! テストごとに作成する。

// テストバイナリごとに使用するヘルパーが異なる
#![allow(dead_code)]

use chrono::{DateTime, Utc};
use docflow_domain::{
    actor::UserId,
    tenant::TenantId,
    value_objects::{DocumentType, RoleKey, StatusKey, WorkflowName},
    workflow::{
        DocumentId,
        NewWorkflowDefinition,
        NewWorkflowInstance,
        WorkflowDefinition,
        WorkflowDefinitionId,
        WorkflowInstance,
        WorkflowInstanceId,
        WorkflowStatus,
        WorkflowTransition,
        WorkflowTransitionId,
    },
};
use docflow_infra::{
    db::{PgTransactionManager, TransactionManager},
    repository::{PostgresWorkflowDefinitionRepository, WorkflowDefinitionRepository},
};
use sqlx::PgPool;

pub fn test_now() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

fn status_key(key: &str) -> StatusKey {
    StatusKey::new(key).unwrap()
}

/// draft → submitted → approved の発注承認定義（承認は manager のみ）
pub fn po_definition(tenant_id: &TenantId) -> WorkflowDefinition {
    let statuses = vec![
        WorkflowStatus::new(status_key("draft"), "下書き", "gray", true),
        WorkflowStatus::new(status_key("submitted"), "申請中", "blue", false),
        WorkflowStatus::new(status_key("approved"), "承認済み", "green", false),
    ];
    let transitions = vec![
        WorkflowTransition::new(
            WorkflowTransitionId::new(),
            status_key("draft"),
            status_key("submitted"),
            "申請",
            None,
            false,
        ),
        WorkflowTransition::new(
            WorkflowTransitionId::new(),
            status_key("submitted"),
            status_key("approved"),
            "承認",
            Some(RoleKey::new("manager").unwrap()),
            false,
        ),
    ];

    WorkflowDefinition::new(NewWorkflowDefinition {
        id:            WorkflowDefinitionId::new(),
        tenant_id:     tenant_id.clone(),
        document_type: DocumentType::new("purchase_order").unwrap(),
        name:          WorkflowName::new("発注承認").unwrap(),
        is_active:     true,
        is_default:    true,
        statuses,
        transitions,
        created_by:    UserId::new(),
        now:           test_now(),
    })
    .unwrap()
}

/// 定義を DB に保存して返す
pub async fn insert_definition(pool: &PgPool, tenant_id: &TenantId) -> WorkflowDefinition {
    let definition = po_definition(tenant_id);
    let repo = PostgresWorkflowDefinitionRepository::new(pool.clone());
    let tx_manager = PgTransactionManager::new(pool.clone());

    let mut tx = tx_manager.begin().await.unwrap();
    repo.insert(&mut tx, &definition).await.unwrap();
    tx.commit().await.unwrap();

    definition
}

/// 定義の初期ステータスでインスタンスを組み立てる（保存はしない）
pub fn create_instance(definition: &WorkflowDefinition) -> WorkflowInstance {
    WorkflowInstance::new(NewWorkflowInstance {
        id: WorkflowInstanceId::new(),
        tenant_id: definition.tenant_id().clone(),
        definition_id: definition.id().clone(),
        document_type: definition.document_type().clone(),
        document_id: DocumentId::new(),
        initial_status_key: definition.initial_status().key().clone(),
        now: test_now(),
    })
}
