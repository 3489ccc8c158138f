//! # ワークフロー対応文書
//!
//! 業務文書（発注書・受注書など）がワークフローに参加するための
//! ケイパビリティ契約。
//!
//! ## 設計方針
//!
//! エンジンにとって文書本体は不透明であり、文書側は自分の
//! `(document_type, document_id)` を公開するだけでよい。
//! 文書の作成処理が [`WorkflowService::initialise_for`] を明示的に呼ぶ。
//!
//! 定義が設定されていない文書種別ではインスタンスが存在しないため、
//! 各メソッドは `None` / 空の Vec を返して穏やかに縮退する
//! （ワークフローなしの文書種別は正常な運用形態であり、エラーではない）。

use docflow_domain::{
    actor::Actor,
    tenant::TenantId,
    value_objects::{DocumentType, StatusKey},
    workflow::{DocumentId, WorkflowHistoryEntry, WorkflowInstance, WorkflowTransition, WorkflowTransitionId},
};
use docflow_infra::repository::{
    WorkflowDefinitionRepository,
    WorkflowHistoryRepository,
    WorkflowInstanceRepository,
};

use crate::{
    error::WorkflowError,
    service::{TransitionRequest, WorkflowService},
};

/// ワークフローに参加する文書の契約
///
/// 文書種別キーと文書 ID を公開する。それ以外の文書の内容に
/// エンジンは関知しない。
pub trait WorkflowDocument {
    /// 文書種別キー（例: `purchase_order`）
    fn workflow_document_type(&self) -> &DocumentType;

    /// 文書の一意識別子
    fn workflow_document_id(&self) -> DocumentId;
}

impl<D, I, H> WorkflowService<D, I, H>
where
    D: WorkflowDefinitionRepository,
    I: WorkflowInstanceRepository,
    H: WorkflowHistoryRepository,
{
    /// 文書のワークフローを初期化する
    ///
    /// 文書の作成処理から呼ぶ。定義が設定されていない文書種別では
    /// `Ok(None)` を返して何もしない。
    pub async fn initialise_for(
        &self,
        tenant_id: &TenantId,
        document: &impl WorkflowDocument,
    ) -> Result<Option<WorkflowInstance>, WorkflowError> {
        self.initialise(
            tenant_id,
            document.workflow_document_type(),
            &document.workflow_document_id(),
        )
        .await
    }

    /// 文書の現在のワークフローステータスを返す
    ///
    /// インスタンスが存在しない（ワークフローなしの文書種別）場合は `None`。
    pub async fn current_status_for(
        &self,
        tenant_id: &TenantId,
        document: &impl WorkflowDocument,
    ) -> Result<Option<StatusKey>, WorkflowError> {
        Ok(self
            .find_instance_for(tenant_id, document)
            .await?
            .map(|i| i.current_status_key().clone()))
    }

    /// 操作者が文書に適用できる遷移を返す
    ///
    /// インスタンスが存在しない場合は空の Vec。
    pub async fn available_transitions_for(
        &self,
        tenant_id: &TenantId,
        document: &impl WorkflowDocument,
        actor: &Actor,
    ) -> Result<Vec<WorkflowTransition>, WorkflowError> {
        let Some(instance) = self.find_instance_for(tenant_id, document).await? else {
            return Ok(Vec::new());
        };

        self.available_transitions(tenant_id, instance.id(), actor)
            .await
    }

    /// 文書に遷移を適用する
    ///
    /// インスタンスが存在しない場合は `Ok(None)` を返して何もしない。
    pub async fn transition_for(
        &self,
        tenant_id: &TenantId,
        document: &impl WorkflowDocument,
        transition_id: WorkflowTransitionId,
        actor: Actor,
        comment: Option<String>,
    ) -> Result<Option<WorkflowHistoryEntry>, WorkflowError> {
        let Some(instance) = self.find_instance_for(tenant_id, document).await? else {
            return Ok(None);
        };

        let entry = self
            .transition(
                tenant_id,
                TransitionRequest {
                    instance_id: instance.id().clone(),
                    transition_id,
                    actor,
                    comment,
                },
            )
            .await?;

        Ok(Some(entry))
    }

    async fn find_instance_for(
        &self,
        tenant_id: &TenantId,
        document: &impl WorkflowDocument,
    ) -> Result<Option<WorkflowInstance>, WorkflowError> {
        Ok(self
            .instance_repo()
            .find_by_document(
                tenant_id,
                document.workflow_document_type(),
                &document.workflow_document_id(),
            )
            .await?)
    }
}
