//! # ワークフローサービス
//!
//! インスタンスの初期化と遷移の適用を司るステートレスなサービス。
//!
//! ## 設計方針
//!
//! - **呼び出しごとに読み直す**: サービスは状態を持たず、検証に必要な
//!   定義・インスタンスを毎回リポジトリから取得する
//! - **検証の順序**: 存在確認 → 遷移元の一致 → ロールガード → コメント必須。
//!   利用者には最初に引っかかった理由だけを返す
//! - **原子性**: 履歴の追記とステータス更新は単一トランザクションで行う。
//!   どちらか一方だけが永続化された状態はデータ破損であり、許容しない
//! - **楽観的ロック**: ステータス更新は読み取り時のバージョンとの一致を
//!   条件とし、並行更新に敗北した側は何も書き込まずに競合エラーを返す

use std::sync::Arc;

use docflow_domain::{
    actor::Actor,
    clock::Clock,
    tenant::TenantId,
    value_objects::{DocumentType, TransitionComment},
    workflow::{
        DocumentId,
        NewWorkflowHistoryEntry,
        NewWorkflowInstance,
        WorkflowDefinition,
        WorkflowHistoryEntry,
        WorkflowHistoryId,
        WorkflowInstance,
        WorkflowInstanceId,
        WorkflowTransition,
        WorkflowTransitionId,
    },
};
use docflow_infra::{
    db::TransactionManager,
    repository::{
        WorkflowDefinitionRepository,
        WorkflowHistoryRepository,
        WorkflowInstanceRepository,
    },
};
use docflow_shared::{event_log::event, log_business_event};

use crate::error::WorkflowError;

/// 遷移要求
///
/// 認証済みの操作者が 1 つの遷移の適用を要求する際の入力。
pub struct TransitionRequest {
    pub instance_id:   WorkflowInstanceId,
    pub transition_id: WorkflowTransitionId,
    pub actor:         Actor,
    pub comment:       Option<String>,
}

/// ワークフローサービス
///
/// リポジトリの実装（Postgres / Mock）をジェネリクスで差し替えられる。
pub struct WorkflowService<D, I, H> {
    definition_repo: D,
    instance_repo:   I,
    history_repo:    H,
    tx_manager:      Arc<dyn TransactionManager>,
    clock:           Arc<dyn Clock>,
}

impl<D, I, H> WorkflowService<D, I, H>
where
    D: WorkflowDefinitionRepository,
    I: WorkflowInstanceRepository,
    H: WorkflowHistoryRepository,
{
    /// 新しいサービスを作成する
    pub fn new(
        definition_repo: D,
        instance_repo: I,
        history_repo: H,
        tx_manager: Arc<dyn TransactionManager>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            definition_repo,
            instance_repo,
            history_repo,
            tx_manager,
            clock,
        }
    }

    /// 文書のワークフローインスタンスを初期化する
    ///
    /// 文書種別の既定かつ有効な定義を解決し、初期ステータスの
    /// インスタンスを作成する。定義が設定されていない文書種別は
    /// ワークフローなしで運用されるため、`Ok(None)` を返して何もしない
    /// （エラーではない）。
    ///
    /// # エラー
    ///
    /// - `WorkflowError::DuplicateInstance`: 同じ文書のインスタンスが既に存在する
    pub async fn initialise(
        &self,
        tenant_id: &TenantId,
        document_type: &DocumentType,
        document_id: &DocumentId,
    ) -> Result<Option<WorkflowInstance>, WorkflowError> {
        let Some(definition) = self
            .definition_repo
            .find_default_active(tenant_id, document_type)
            .await?
        else {
            tracing::debug!(
                tenant_id = %tenant_id,
                document_type = %document_type,
                "既定のワークフロー定義がないため初期化をスキップ"
            );
            return Ok(None);
        };

        // 早期フェイル。競合する同時初期化は一意制約が最終防衛線になる
        if self
            .instance_repo
            .find_by_document(tenant_id, document_type, document_id)
            .await?
            .is_some()
        {
            return Err(WorkflowError::DuplicateInstance(document_id.to_string()));
        }

        let now = self.clock.now();
        let instance = WorkflowInstance::new(NewWorkflowInstance {
            id: WorkflowInstanceId::new(),
            tenant_id: tenant_id.clone(),
            definition_id: definition.id().clone(),
            document_type: document_type.clone(),
            document_id: document_id.clone(),
            initial_status_key: definition.initial_status().key().clone(),
            now,
        });

        let mut tx = self.tx_manager.begin().await?;
        self.instance_repo
            .insert(&mut tx, &instance)
            .await
            .map_err(|e| {
                if e.as_conflict().is_some() {
                    WorkflowError::DuplicateInstance(document_id.to_string())
                } else {
                    WorkflowError::Infra(e)
                }
            })?;
        tx.commit().await?;

        log_business_event!(
            event.category = event::category::WORKFLOW,
            event.action = event::action::INSTANCE_INITIALISED,
            event.entity_type = event::entity_type::WORKFLOW_INSTANCE,
            event.entity_id = %instance.id(),
            event.tenant_id = %tenant_id,
            event.result = event::result::SUCCESS,
            "ワークフローインスタンスを初期化"
        );

        Ok(Some(instance))
    }

    /// 操作者が現在のステータスから適用できる遷移を定義順に返す
    ///
    /// 該当する遷移がない場合は空の Vec を返す（エラーではない）。
    /// 終端ステータスと権限不足はこの層では区別されない。
    pub async fn available_transitions(
        &self,
        tenant_id: &TenantId,
        instance_id: &WorkflowInstanceId,
        actor: &Actor,
    ) -> Result<Vec<WorkflowTransition>, WorkflowError> {
        let instance = self.load_instance(tenant_id, instance_id).await?;
        let definition = self.load_definition(tenant_id, &instance).await?;

        Ok(definition
            .transitions_from(instance.current_status_key())
            .filter(|t| t.guard_satisfied_by(actor))
            .cloned()
            .collect())
    }

    /// 遷移を検証して適用する
    ///
    /// ## 処理フロー
    ///
    /// 1. インスタンス・定義・遷移を取得
    /// 2. 遷移元ステータスの一致を検証
    /// 3. ロールガードを検証
    /// 4. コメント必須を検証
    /// 5. ステータス更新（バージョン一致チェック）と履歴追記を
    ///    単一トランザクションで実行
    /// 6. イベントログ
    ///
    /// # エラー
    ///
    /// - `WorkflowError::NotFound`: インスタンス・定義・遷移が存在しない
    /// - `WorkflowError::IllegalTransition`: 遷移元ステータスの不一致
    /// - `WorkflowError::Forbidden`: ロールガードを満たさない
    /// - `WorkflowError::CommentRequired`: 必須コメントの欠落
    /// - `WorkflowError::ConcurrentModification`: 並行更新に敗北（書き込みなし）
    pub async fn transition(
        &self,
        tenant_id: &TenantId,
        request: TransitionRequest,
    ) -> Result<WorkflowHistoryEntry, WorkflowError> {
        let instance_id = request.instance_id.clone();
        let actor_id = request.actor.user_id().clone();

        match self.apply_transition(tenant_id, request).await {
            Ok(entry) => {
                log_business_event!(
                    event.category = event::category::WORKFLOW,
                    event.action = event::action::TRANSITION_APPLIED,
                    event.entity_type = event::entity_type::WORKFLOW_INSTANCE,
                    event.entity_id = %instance_id,
                    event.actor_id = %actor_id,
                    event.tenant_id = %tenant_id,
                    event.result = event::result::SUCCESS,
                    "ワークフロー遷移を適用"
                );
                Ok(entry)
            }
            Err(
                e @ (WorkflowError::IllegalTransition(_)
                | WorkflowError::Forbidden(_)
                | WorkflowError::CommentRequired(_)
                | WorkflowError::ConcurrentModification),
            ) => {
                log_business_event!(
                    event.category = event::category::WORKFLOW,
                    event.action = event::action::TRANSITION_REJECTED,
                    event.entity_type = event::entity_type::WORKFLOW_INSTANCE,
                    event.entity_id = %instance_id,
                    event.actor_id = %actor_id,
                    event.tenant_id = %tenant_id,
                    event.result = event::result::FAILURE,
                    reason = %e,
                    "ワークフロー遷移を拒否"
                );
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// インスタンスの履歴を適用順（古い順）に返す
    pub async fn history(
        &self,
        tenant_id: &TenantId,
        instance_id: &WorkflowInstanceId,
    ) -> Result<Vec<WorkflowHistoryEntry>, WorkflowError> {
        // インスタンスの存在確認を兼ねる（別テナントの履歴を空列と誤認させない）
        self.load_instance(tenant_id, instance_id).await?;

        Ok(self
            .history_repo
            .find_by_instance(instance_id, tenant_id)
            .await?)
    }

    // ===== 内部ヘルパー =====

    /// 文書ベースの便宜メソッド（document モジュール）が使用する
    pub(crate) fn instance_repo(&self) -> &I {
        &self.instance_repo
    }

    async fn apply_transition(
        &self,
        tenant_id: &TenantId,
        request: TransitionRequest,
    ) -> Result<WorkflowHistoryEntry, WorkflowError> {
        let instance = self.load_instance(tenant_id, &request.instance_id).await?;
        let definition = self.load_definition(tenant_id, &instance).await?;

        let transition = definition.transition(&request.transition_id).ok_or_else(|| {
            WorkflowError::NotFound(format!("ワークフロー遷移({})", request.transition_id))
        })?;

        if transition.from_status_key() != instance.current_status_key() {
            return Err(WorkflowError::IllegalTransition(format!(
                "「{}」は {} からの操作です（現在: {}）",
                transition.label(),
                transition.from_status_key(),
                instance.current_status_key(),
            )));
        }

        if !transition.guard_satisfied_by(&request.actor) {
            return Err(WorkflowError::Forbidden(transition.label().to_string()));
        }

        let comment = TransitionComment::from_input(request.comment);
        if transition.requires_comment() && comment.is_none() {
            return Err(WorkflowError::CommentRequired(transition.label().to_string()));
        }

        let now = self.clock.now();
        let expected_version = instance.version();
        let from_status_key = instance.current_status_key().clone();
        let updated = instance.applied(transition, now)?;

        let entry = WorkflowHistoryEntry::new(NewWorkflowHistoryEntry {
            id: WorkflowHistoryId::new(),
            instance_id: updated.id().clone(),
            tenant_id: tenant_id.clone(),
            from_status_key,
            to_status_key: updated.current_status_key().clone(),
            transition_label: transition.label().to_string(),
            actor_id: request.actor.user_id().clone(),
            comment,
            now,
        });

        // バージョン一致チェックを先に行う。競合に敗北した場合は
        // 履歴を含め何も書き込まずにトランザクションを破棄する
        let mut tx = self.tx_manager.begin().await?;
        self.instance_repo
            .update_with_version_check(&mut tx, &updated, expected_version)
            .await
            .map_err(|e| {
                if e.as_conflict().is_some() {
                    WorkflowError::ConcurrentModification
                } else {
                    WorkflowError::Infra(e)
                }
            })?;
        self.history_repo.insert(&mut tx, &entry).await?;
        tx.commit().await?;

        Ok(entry)
    }

    async fn load_instance(
        &self,
        tenant_id: &TenantId,
        instance_id: &WorkflowInstanceId,
    ) -> Result<WorkflowInstance, WorkflowError> {
        self.instance_repo
            .find_by_id(instance_id, tenant_id)
            .await?
            .ok_or_else(|| {
                WorkflowError::NotFound(format!("ワークフローインスタンス({instance_id})"))
            })
    }

    async fn load_definition(
        &self,
        tenant_id: &TenantId,
        instance: &WorkflowInstance,
    ) -> Result<WorkflowDefinition, WorkflowError> {
        self.definition_repo
            .find_by_id(instance.definition_id(), tenant_id)
            .await?
            .ok_or_else(|| {
                WorkflowError::NotFound(format!("ワークフロー定義({})", instance.definition_id()))
            })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use docflow_domain::{
        actor::UserId,
        clock::FixedClock,
        value_objects::{RoleKey, StatusKey, Version, WorkflowName},
        workflow::{
            NewWorkflowDefinition,
            WorkflowDefinitionId,
            WorkflowStatus,
        },
    };
    use docflow_infra::{
        InfraError,
        db::TxContext,
        mock::{
            MockTransactionManager,
            MockWorkflowDefinitionRepository,
            MockWorkflowHistoryRepository,
            MockWorkflowInstanceRepository,
        },
    };
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    use super::*;

    type TestService = WorkflowService<
        MockWorkflowDefinitionRepository,
        MockWorkflowInstanceRepository,
        MockWorkflowHistoryRepository,
    >;

    fn status_key(key: &str) -> StatusKey {
        StatusKey::new(key).unwrap()
    }

    fn role(key: &str) -> RoleKey {
        RoleKey::new(key).unwrap()
    }

    #[fixture]
    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[fixture]
    fn tenant_id() -> TenantId {
        TenantId::new()
    }

    #[fixture]
    fn staff() -> Actor {
        Actor::new(UserId::new(), vec![role("staff")])
    }

    #[fixture]
    fn manager() -> Actor {
        Actor::new(UserId::new(), vec![role("staff"), role("manager")])
    }

    /// 発注承認定義
    ///
    /// - draft → submitted（申請、誰でも）
    /// - submitted → approved（承認、manager のみ）
    /// - submitted → rejected（却下、manager のみ、コメント必須）
    fn po_definition(tenant_id: &TenantId, now: DateTime<Utc>) -> WorkflowDefinition {
        let statuses = vec![
            WorkflowStatus::new(status_key("draft"), "下書き", "gray", true),
            WorkflowStatus::new(status_key("submitted"), "申請中", "blue", false),
            WorkflowStatus::new(status_key("approved"), "承認済み", "green", false),
            WorkflowStatus::new(status_key("rejected"), "却下", "red", false),
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
                Some(role("manager")),
                false,
            ),
            WorkflowTransition::new(
                WorkflowTransitionId::new(),
                status_key("submitted"),
                status_key("rejected"),
                "却下",
                Some(role("manager")),
                true,
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
            now,
        })
        .unwrap()
    }

    struct TestContext {
        service:         TestService,
        definition:      WorkflowDefinition,
        instance_repo:   MockWorkflowInstanceRepository,
        history_repo:    MockWorkflowHistoryRepository,
        tenant_id:       TenantId,
        document_type:   DocumentType,
    }

    #[fixture]
    fn ctx(tenant_id: TenantId, now: DateTime<Utc>) -> TestContext {
        let definition = po_definition(&tenant_id, now);
        let definition_repo = MockWorkflowDefinitionRepository::new();
        definition_repo.add_definition(definition.clone());
        let instance_repo = MockWorkflowInstanceRepository::new();
        let history_repo = MockWorkflowHistoryRepository::new();

        let service = WorkflowService::new(
            definition_repo,
            instance_repo.clone(),
            history_repo.clone(),
            Arc::new(MockTransactionManager::new()),
            Arc::new(FixedClock::new(now)),
        );

        TestContext {
            service,
            definition,
            instance_repo,
            history_repo,
            tenant_id,
            document_type: DocumentType::new("purchase_order").unwrap(),
        }
    }

    /// ラベルで遷移 ID を引く
    fn transition_id(definition: &WorkflowDefinition, label: &str) -> WorkflowTransitionId {
        definition
            .transitions()
            .iter()
            .find(|t| t.label() == label)
            .unwrap()
            .id()
            .clone()
    }

    async fn initialised_instance(ctx: &TestContext) -> WorkflowInstance {
        ctx.service
            .initialise(&ctx.tenant_id, &ctx.document_type, &DocumentId::new())
            .await
            .unwrap()
            .unwrap()
    }

    fn request(
        instance: &WorkflowInstance,
        transition_id: WorkflowTransitionId,
        actor: &Actor,
        comment: Option<&str>,
    ) -> TransitionRequest {
        TransitionRequest {
            instance_id:   instance.id().clone(),
            transition_id,
            actor:         actor.clone(),
            comment:       comment.map(str::to_string),
        }
    }

    // ===== initialise =====

    #[rstest]
    #[tokio::test]
    async fn test_定義がない文書種別の初期化は何もしない(ctx: TestContext) {
        let other_type = DocumentType::new("sales_order").unwrap();
        let document_id = DocumentId::new();

        let result = ctx
            .service
            .initialise(&ctx.tenant_id, &other_type, &document_id)
            .await
            .unwrap();

        assert!(result.is_none());
        let stored = ctx
            .instance_repo
            .find_by_document(&ctx.tenant_id, &other_type, &document_id)
            .await
            .unwrap();
        assert!(stored.is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn test_別テナントの定義では初期化されない(ctx: TestContext) {
        let result = ctx
            .service
            .initialise(&TenantId::new(), &ctx.document_type, &DocumentId::new())
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn test_初期化で初期ステータスのインスタンスが作成される(
        ctx: TestContext,
        now: DateTime<Utc>,
    ) {
        let document_id = DocumentId::new();

        let instance = ctx
            .service
            .initialise(&ctx.tenant_id, &ctx.document_type, &document_id)
            .await
            .unwrap()
            .expect("定義があるのでインスタンスが作成される");

        assert_eq!(instance.current_status_key().as_str(), "draft");
        assert_eq!(instance.version(), Version::initial());
        assert_eq!(instance.definition_id(), ctx.definition.id());
        assert_eq!(instance.created_at(), now);

        let stored = ctx
            .instance_repo
            .find_by_document(&ctx.tenant_id, &ctx.document_type, &document_id)
            .await
            .unwrap();
        assert_eq!(stored, Some(instance));
    }

    #[rstest]
    #[tokio::test]
    async fn test_同じ文書の二重初期化はエラー(ctx: TestContext) {
        let document_id = DocumentId::new();

        ctx.service
            .initialise(&ctx.tenant_id, &ctx.document_type, &document_id)
            .await
            .unwrap();
        let result = ctx
            .service
            .initialise(&ctx.tenant_id, &ctx.document_type, &document_id)
            .await;

        assert!(matches!(result, Err(WorkflowError::DuplicateInstance(_))));
    }

    // ===== available_transitions =====

    #[rstest]
    #[tokio::test]
    async fn test_下書きからは申請のみが利用可能(ctx: TestContext, staff: Actor) {
        let instance = initialised_instance(&ctx).await;

        let transitions = ctx
            .service
            .available_transitions(&ctx.tenant_id, instance.id(), &staff)
            .await
            .unwrap();

        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].label(), "申請");
    }

    #[rstest]
    #[tokio::test]
    async fn test_利用可能な遷移はロールで絞られる(
        ctx: TestContext,
        staff: Actor,
        manager: Actor,
    ) {
        let instance = initialised_instance(&ctx).await;
        ctx.service
            .transition(
                &ctx.tenant_id,
                request(&instance, transition_id(&ctx.definition, "申請"), &staff, None),
            )
            .await
            .unwrap();

        let staff_transitions = ctx
            .service
            .available_transitions(&ctx.tenant_id, instance.id(), &staff)
            .await
            .unwrap();
        let manager_transitions = ctx
            .service
            .available_transitions(&ctx.tenant_id, instance.id(), &manager)
            .await
            .unwrap();

        // 担当者には何もなし（終端と権限不足はこの層では区別されない）
        assert!(staff_transitions.is_empty());
        // マネージャには定義順で承認・却下
        let labels: Vec<_> = manager_transitions.iter().map(|t| t.label()).collect();
        assert_eq!(labels, vec!["承認", "却下"]);
    }

    #[rstest]
    #[tokio::test]
    async fn test_存在しないインスタンスはnot_found(ctx: TestContext, staff: Actor) {
        let result = ctx
            .service
            .available_transitions(&ctx.tenant_id, &WorkflowInstanceId::new(), &staff)
            .await;

        assert!(matches!(result, Err(WorkflowError::NotFound(_))));
    }

    #[rstest]
    #[tokio::test]
    async fn test_別テナントからはインスタンスが見えない(ctx: TestContext, staff: Actor) {
        let instance = initialised_instance(&ctx).await;

        let result = ctx
            .service
            .available_transitions(&TenantId::new(), instance.id(), &staff)
            .await;

        assert!(matches!(result, Err(WorkflowError::NotFound(_))));
    }

    // ===== transition =====

    #[rstest]
    #[tokio::test]
    async fn test_遷移の適用で履歴とステータスが更新される(
        ctx: TestContext,
        staff: Actor,
        now: DateTime<Utc>,
    ) {
        let instance = initialised_instance(&ctx).await;

        let entry = ctx
            .service
            .transition(
                &ctx.tenant_id,
                request(&instance, transition_id(&ctx.definition, "申請"), &staff, None),
            )
            .await
            .unwrap();

        assert_eq!(entry.from_status_key().as_str(), "draft");
        assert_eq!(entry.to_status_key().as_str(), "submitted");
        assert_eq!(entry.transition_label(), "申請");
        assert_eq!(entry.actor_id(), staff.user_id());
        assert!(entry.comment().is_none());
        assert_eq!(entry.created_at(), now);

        let updated = ctx
            .instance_repo
            .find_by_id(instance.id(), &ctx.tenant_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.current_status_key().as_str(), "submitted");
        assert_eq!(updated.version(), instance.version().next());

        let history = ctx
            .history_repo
            .find_by_instance(instance.id(), &ctx.tenant_id)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn test_定義にない遷移はnot_found(ctx: TestContext, staff: Actor) {
        let instance = initialised_instance(&ctx).await;

        let result = ctx
            .service
            .transition(
                &ctx.tenant_id,
                request(&instance, WorkflowTransitionId::new(), &staff, None),
            )
            .await;

        assert!(matches!(result, Err(WorkflowError::NotFound(_))));
    }

    #[rstest]
    #[tokio::test]
    async fn test_遷移元が一致しない遷移は拒否され状態は変わらない(
        ctx: TestContext,
        manager: Actor,
    ) {
        let instance = initialised_instance(&ctx).await;

        // draft から直接「承認」は不正
        let result = ctx
            .service
            .transition(
                &ctx.tenant_id,
                request(&instance, transition_id(&ctx.definition, "承認"), &manager, None),
            )
            .await;

        assert!(matches!(result, Err(WorkflowError::IllegalTransition(_))));

        let stored = ctx
            .instance_repo
            .find_by_id(instance.id(), &ctx.tenant_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.current_status_key().as_str(), "draft");
        assert_eq!(stored.version(), Version::initial());
        let history = ctx
            .history_repo
            .find_by_instance(instance.id(), &ctx.tenant_id)
            .await
            .unwrap();
        assert!(history.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn test_ロールガードを満たさない遷移は拒否され状態は変わらない(
        ctx: TestContext,
        staff: Actor,
    ) {
        let instance = initialised_instance(&ctx).await;
        ctx.service
            .transition(
                &ctx.tenant_id,
                request(&instance, transition_id(&ctx.definition, "申請"), &staff, None),
            )
            .await
            .unwrap();

        let result = ctx
            .service
            .transition(
                &ctx.tenant_id,
                request(&instance, transition_id(&ctx.definition, "承認"), &staff, None),
            )
            .await;

        assert!(matches!(result, Err(WorkflowError::Forbidden(_))));

        let stored = ctx
            .instance_repo
            .find_by_id(instance.id(), &ctx.tenant_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.current_status_key().as_str(), "submitted");
    }

    #[rstest]
    #[case::コメントなし(None)]
    #[case::空白のみ(Some("   "))]
    #[tokio::test]
    async fn test_コメント必須の遷移はコメントなしで拒否される(
        ctx: TestContext,
        staff: Actor,
        manager: Actor,
        #[case] comment: Option<&str>,
    ) {
        let instance = initialised_instance(&ctx).await;
        ctx.service
            .transition(
                &ctx.tenant_id,
                request(&instance, transition_id(&ctx.definition, "申請"), &staff, None),
            )
            .await
            .unwrap();

        let result = ctx
            .service
            .transition(
                &ctx.tenant_id,
                request(&instance, transition_id(&ctx.definition, "却下"), &manager, comment),
            )
            .await;

        assert!(matches!(result, Err(WorkflowError::CommentRequired(_))));
    }

    #[rstest]
    #[tokio::test]
    async fn test_コメント付きで却下できる(ctx: TestContext, staff: Actor, manager: Actor) {
        let instance = initialised_instance(&ctx).await;
        ctx.service
            .transition(
                &ctx.tenant_id,
                request(&instance, transition_id(&ctx.definition, "申請"), &staff, None),
            )
            .await
            .unwrap();

        let entry = ctx
            .service
            .transition(
                &ctx.tenant_id,
                request(
                    &instance,
                    transition_id(&ctx.definition, "却下"),
                    &manager,
                    Some("見積金額を再確認してください"),
                ),
            )
            .await
            .unwrap();

        assert_eq!(entry.to_status_key().as_str(), "rejected");
        assert_eq!(
            entry.comment().unwrap().as_str(),
            "見積金額を再確認してください"
        );
    }

    // ===== 発注承認シナリオ =====

    #[rstest]
    #[tokio::test]
    async fn test_発注承認シナリオ(ctx: TestContext, staff: Actor, manager: Actor) {
        let instance = initialised_instance(&ctx).await;

        ctx.service
            .transition(
                &ctx.tenant_id,
                request(&instance, transition_id(&ctx.definition, "申請"), &staff, None),
            )
            .await
            .unwrap();
        ctx.service
            .transition(
                &ctx.tenant_id,
                request(&instance, transition_id(&ctx.definition, "承認"), &manager, None),
            )
            .await
            .unwrap();

        let stored = ctx
            .instance_repo
            .find_by_id(instance.id(), &ctx.tenant_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.current_status_key().as_str(), "approved");
        assert_eq!(stored.version().as_u32(), 3);

        // 履歴列が初期ステータスから現在ステータスまで連鎖している
        let history = ctx
            .service
            .history(&ctx.tenant_id, instance.id())
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].from_status_key().as_str(), "draft");
        assert_eq!(history[0].to_status_key(), history[1].from_status_key());
        assert_eq!(
            history[1].to_status_key(),
            stored.current_status_key()
        );
    }

    // ===== 並行更新 =====

    /// 常に古いスナップショットを返すラッパー
    ///
    /// 「2 つのリクエストが同じ現在ステータスを読んで両方とも検証を通過する」
    /// 状況を決定的に再現する。書き込みは実ストレージに委譲するため、
    /// バージョン一致チェックは最新の状態に対して行われる。
    struct StaleReadInstanceRepository {
        inner: MockWorkflowInstanceRepository,
        stale: WorkflowInstance,
    }

    #[async_trait]
    impl WorkflowInstanceRepository for StaleReadInstanceRepository {
        async fn insert(
            &self,
            tx: &mut TxContext,
            instance: &WorkflowInstance,
        ) -> Result<(), InfraError> {
            self.inner.insert(tx, instance).await
        }

        async fn update_with_version_check(
            &self,
            tx: &mut TxContext,
            instance: &WorkflowInstance,
            expected_version: Version,
        ) -> Result<(), InfraError> {
            self.inner
                .update_with_version_check(tx, instance, expected_version)
                .await
        }

        async fn find_by_id(
            &self,
            id: &WorkflowInstanceId,
            tenant_id: &TenantId,
        ) -> Result<Option<WorkflowInstance>, InfraError> {
            if self.stale.id() == id && self.stale.tenant_id() == tenant_id {
                Ok(Some(self.stale.clone()))
            } else {
                self.inner.find_by_id(id, tenant_id).await
            }
        }

        async fn find_by_document(
            &self,
            tenant_id: &TenantId,
            document_type: &DocumentType,
            document_id: &DocumentId,
        ) -> Result<Option<WorkflowInstance>, InfraError> {
            self.inner
                .find_by_document(tenant_id, document_type, document_id)
                .await
        }
    }

    #[rstest]
    #[tokio::test]
    async fn test_並行遷移は片方だけ成功する(
        ctx: TestContext,
        staff: Actor,
        now: DateTime<Utc>,
    ) {
        let instance = initialised_instance(&ctx).await;

        // 先勝ちの遷移が適用される
        ctx.service
            .transition(
                &ctx.tenant_id,
                request(&instance, transition_id(&ctx.definition, "申請"), &staff, None),
            )
            .await
            .unwrap();

        // 後発は更新前のスナップショットで検証を通過するが、
        // バージョン一致チェックで敗北する
        let definition_repo = MockWorkflowDefinitionRepository::new();
        definition_repo.add_definition(ctx.definition.clone());
        let racer = WorkflowService::new(
            definition_repo,
            StaleReadInstanceRepository {
                inner: ctx.instance_repo.clone(),
                stale: instance.clone(),
            },
            ctx.history_repo.clone(),
            Arc::new(MockTransactionManager::new()),
            Arc::new(FixedClock::new(now)),
        );

        let result = racer
            .transition(
                &ctx.tenant_id,
                request(&instance, transition_id(&ctx.definition, "申請"), &staff, None),
            )
            .await;

        assert!(matches!(result, Err(WorkflowError::ConcurrentModification)));

        // 敗北した側は何も書き込んでいない
        let stored = ctx
            .instance_repo
            .find_by_id(instance.id(), &ctx.tenant_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.current_status_key().as_str(), "submitted");
        assert_eq!(stored.version().as_u32(), 2);
        let history = ctx
            .history_repo
            .find_by_instance(instance.id(), &ctx.tenant_id)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
    }
}
