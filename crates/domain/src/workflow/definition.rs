//! # ワークフロー定義
//!
//! 文書種別ごとに設定されたステートマシン定義を管理する。
//! ステータス（状態空間）と遷移（エッジ）の集合を集約として保持し、
//! 実行中のインスタンスからは読み取り専用で参照される。

use chrono::{DateTime, Utc};

use crate::{
    DomainError,
    actor::{Actor, UserId},
    tenant::TenantId,
    value_objects::{DocumentType, RoleKey, StatusKey, WorkflowName},
    workflow::definition_validator::validate_definition,
};

define_uuid_id! {
    /// ワークフロー定義 ID
    pub struct WorkflowDefinitionId;
}

define_uuid_id! {
    /// ワークフロー遷移 ID
    pub struct WorkflowTransitionId;
}

/// ワークフローステータス（状態空間の 1 要素）
///
/// 定義に属する名前付き状態。`is_initial` が真のステータスが
/// インスタンス生成時の初期状態になる（定義ごとに必ず 1 つ）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowStatus {
    key:        StatusKey,
    label:      String,
    color:      String,
    is_initial: bool,
}

impl WorkflowStatus {
    /// ステータスを作成する
    pub fn new(
        key: StatusKey,
        label: impl Into<String>,
        color: impl Into<String>,
        is_initial: bool,
    ) -> Self {
        Self {
            key,
            label: label.into(),
            color: color.into(),
            is_initial,
        }
    }

    pub fn key(&self) -> &StatusKey {
        &self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// 管理画面での表示色（`#16a34a` やパレット名）
    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn is_initial(&self) -> bool {
        self.is_initial
    }
}

/// ワークフロー遷移（状態間のエッジ）
///
/// `from_status_key → to_status_key` の有向エッジ。
/// 同じ遷移元を共有する複数の遷移（分岐）を定義でき、
/// どれを適用するかは呼び出し側が選択する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowTransition {
    id:               WorkflowTransitionId,
    from_status_key:  StatusKey,
    to_status_key:    StatusKey,
    label:            String,
    required_role:    Option<RoleKey>,
    requires_comment: bool,
}

impl WorkflowTransition {
    /// 遷移を作成する
    pub fn new(
        id: WorkflowTransitionId,
        from_status_key: StatusKey,
        to_status_key: StatusKey,
        label: impl Into<String>,
        required_role: Option<RoleKey>,
        requires_comment: bool,
    ) -> Self {
        Self {
            id,
            from_status_key,
            to_status_key,
            label: label.into(),
            required_role,
            requires_comment,
        }
    }

    pub fn id(&self) -> &WorkflowTransitionId {
        &self.id
    }

    pub fn from_status_key(&self) -> &StatusKey {
        &self.from_status_key
    }

    pub fn to_status_key(&self) -> &StatusKey {
        &self.to_status_key
    }

    /// 操作ボタン等に表示するラベル（例: 「承認」「差し戻し」）
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn required_role(&self) -> Option<&RoleKey> {
        self.required_role.as_ref()
    }

    pub fn requires_comment(&self) -> bool {
        self.requires_comment
    }

    /// 操作者がこの遷移のロールガードを満たすか判定する
    ///
    /// ガードが設定されていない遷移は誰でも適用できる。
    pub fn guard_satisfied_by(&self, actor: &Actor) -> bool {
        match &self.required_role {
            Some(role) => actor.has_role(role),
            None => true,
        }
    }
}

/// ワークフロー定義エンティティ（集約ルート）
///
/// テナント × 文書種別ごとのステートマシン定義。
/// `is_default && is_active` な定義が 1 件だけ、その文書種別の
/// 正式な定義として扱われる（一意性は永続化層の部分一意索引で保証）。
///
/// # 不変条件
///
/// - ステータスは 1 件以上、キーは定義内で一意
/// - `is_initial` なステータスはちょうど 1 件
/// - すべての遷移の両端は定義内のステータスを参照する
///
/// 構築時（[`new`](Self::new)）と DB 復元時（[`from_db`](Self::from_db)）の
/// 両方で [`validate_definition`] により検証される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowDefinition {
    id:            WorkflowDefinitionId,
    tenant_id:     TenantId,
    document_type: DocumentType,
    name:          WorkflowName,
    is_active:     bool,
    is_default:    bool,
    statuses:      Vec<WorkflowStatus>,
    transitions:   Vec<WorkflowTransition>,
    created_by:    UserId,
    created_at:    DateTime<Utc>,
    updated_at:    DateTime<Utc>,
}

/// ワークフロー定義の新規作成パラメータ
pub struct NewWorkflowDefinition {
    pub id:            WorkflowDefinitionId,
    pub tenant_id:     TenantId,
    pub document_type: DocumentType,
    pub name:          WorkflowName,
    pub is_active:     bool,
    pub is_default:    bool,
    pub statuses:      Vec<WorkflowStatus>,
    pub transitions:   Vec<WorkflowTransition>,
    pub created_by:    UserId,
    pub now:           DateTime<Utc>,
}

/// ワークフロー定義の DB 復元パラメータ
pub struct WorkflowDefinitionRecord {
    pub id:            WorkflowDefinitionId,
    pub tenant_id:     TenantId,
    pub document_type: DocumentType,
    pub name:          WorkflowName,
    pub is_active:     bool,
    pub is_default:    bool,
    pub statuses:      Vec<WorkflowStatus>,
    pub transitions:   Vec<WorkflowTransition>,
    pub created_by:    UserId,
    pub created_at:    DateTime<Utc>,
    pub updated_at:    DateTime<Utc>,
}

impl WorkflowDefinition {
    /// 新しいワークフロー定義を作成する
    ///
    /// # エラー
    ///
    /// - `DomainError::Validation`: 不変条件違反
    ///   （初期ステータスの欠落・重複、未知のステータスへの遷移など）
    pub fn new(params: NewWorkflowDefinition) -> Result<Self, DomainError> {
        validate_definition(&params.statuses, &params.transitions)?;

        Ok(Self {
            id:            params.id,
            tenant_id:     params.tenant_id,
            document_type: params.document_type,
            name:          params.name,
            is_active:     params.is_active,
            is_default:    params.is_default,
            statuses:      params.statuses,
            transitions:   params.transitions,
            created_by:    params.created_by,
            created_at:    params.now,
            updated_at:    params.now,
        })
    }

    /// 既存のデータから復元する
    ///
    /// 管理者が DB 上で編集した定義が壊れている可能性があるため、
    /// 復元時にも不変条件を検証する。
    ///
    /// # エラー
    ///
    /// - `DomainError::Validation`: 不変条件違反
    pub fn from_db(record: WorkflowDefinitionRecord) -> Result<Self, DomainError> {
        validate_definition(&record.statuses, &record.transitions)?;

        Ok(Self {
            id:            record.id,
            tenant_id:     record.tenant_id,
            document_type: record.document_type,
            name:          record.name,
            is_active:     record.is_active,
            is_default:    record.is_default,
            statuses:      record.statuses,
            transitions:   record.transitions,
            created_by:    record.created_by,
            created_at:    record.created_at,
            updated_at:    record.updated_at,
        })
    }

    // Getter メソッド

    pub fn id(&self) -> &WorkflowDefinitionId {
        &self.id
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    pub fn document_type(&self) -> &DocumentType {
        &self.document_type
    }

    pub fn name(&self) -> &WorkflowName {
        &self.name
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }

    pub fn statuses(&self) -> &[WorkflowStatus] {
        &self.statuses
    }

    pub fn transitions(&self) -> &[WorkflowTransition] {
        &self.transitions
    }

    pub fn created_by(&self) -> &UserId {
        &self.created_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // 参照メソッド

    /// 初期ステータスを取得する
    ///
    /// # パニック
    ///
    /// 構築時に「初期ステータスがちょうど 1 件」を検証済みのため、
    /// 到達しない想定。
    pub fn initial_status(&self) -> &WorkflowStatus {
        self.statuses
            .iter()
            .find(|s| s.is_initial())
            .expect("検証済みの定義に初期ステータスが存在しません")
    }

    /// キーでステータスを取得する
    pub fn status(&self, key: &StatusKey) -> Option<&WorkflowStatus> {
        self.statuses.iter().find(|s| s.key() == key)
    }

    /// ID で遷移を取得する
    pub fn transition(&self, id: &WorkflowTransitionId) -> Option<&WorkflowTransition> {
        self.transitions.iter().find(|t| t.id() == id)
    }

    /// 指定ステータスを遷移元とする遷移を定義順に返す
    pub fn transitions_from<'a>(
        &'a self,
        from: &'a StatusKey,
    ) -> impl Iterator<Item = &'a WorkflowTransition> {
        self.transitions
            .iter()
            .filter(move |t| t.from_status_key() == from)
    }

    // 不変更新メソッド

    /// 定義を無効化した新しいインスタンスを返す
    ///
    /// 無効化された定義は新規インスタンスの初期化対象から外れるが、
    /// 既存インスタンスからの参照は維持される（定義は削除されない）。
    pub fn deactivated(self, now: DateTime<Utc>) -> Self {
        Self {
            is_active: false,
            updated_at: now,
            ..self
        }
    }
}
