//! # ワークフローインスタンス
//!
//! 1 件の業務文書のワークフロー進行状態を管理する。
//! 文書の作成時に（定義が設定されていれば）ちょうど 1 件生成され、
//! 以降は遷移の適用によってのみ更新される。
//!
//! ## 楽観的ロック
//!
//! `version` フィールドにより並行遷移の競合を検出する。
//! 2 つのリクエストが同じ `current_status_key` を読んで両方とも検証を
//! 通過しても、永続化層のバージョン一致チェックにより片方だけが
//! 書き込みに成功する（lost update の防止）。

use chrono::{DateTime, Utc};

use crate::{
    DomainError,
    tenant::TenantId,
    value_objects::{DocumentType, StatusKey, Version},
    workflow::definition::{WorkflowDefinitionId, WorkflowTransition},
};

define_uuid_id! {
    /// ワークフローインスタンス ID
    pub struct WorkflowInstanceId;
}

define_uuid_id! {
    /// 業務文書（発注書・受注書など）の一意識別子
    ///
    /// ワークフローエンジンにとって文書本体は不透明であり、
    /// `(document_type, document_id)` の組で参照するのみ。
    pub struct DocumentId;
}

/// ワークフローインスタンスエンティティ
///
/// `(tenant_id, document_type, document_id)` ごとに 1 件。
/// `current_status_key` は定義内の有効なステータスを常に参照し、
/// 最新の履歴エントリの `to_status_key` と一致する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowInstance {
    id: WorkflowInstanceId,
    tenant_id: TenantId,
    definition_id: WorkflowDefinitionId,
    document_type: DocumentType,
    document_id: DocumentId,
    current_status_key: StatusKey,
    version: Version,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// ワークフローインスタンスの新規作成パラメータ
pub struct NewWorkflowInstance {
    pub id: WorkflowInstanceId,
    pub tenant_id: TenantId,
    pub definition_id: WorkflowDefinitionId,
    pub document_type: DocumentType,
    pub document_id: DocumentId,
    pub initial_status_key: StatusKey,
    pub now: DateTime<Utc>,
}

/// ワークフローインスタンスの DB 復元パラメータ
pub struct WorkflowInstanceRecord {
    pub id: WorkflowInstanceId,
    pub tenant_id: TenantId,
    pub definition_id: WorkflowDefinitionId,
    pub document_type: DocumentType,
    pub document_id: DocumentId,
    pub current_status_key: StatusKey,
    pub version: Version,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowInstance {
    /// 定義の初期ステータスで新しいインスタンスを作成する
    pub fn new(params: NewWorkflowInstance) -> Self {
        Self {
            id: params.id,
            tenant_id: params.tenant_id,
            definition_id: params.definition_id,
            document_type: params.document_type,
            document_id: params.document_id,
            current_status_key: params.initial_status_key,
            version: Version::initial(),
            created_at: params.now,
            updated_at: params.now,
        }
    }

    /// 既存のデータから復元する
    pub fn from_db(record: WorkflowInstanceRecord) -> Self {
        Self {
            id: record.id,
            tenant_id: record.tenant_id,
            definition_id: record.definition_id,
            document_type: record.document_type,
            document_id: record.document_id,
            current_status_key: record.current_status_key,
            version: record.version,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    // Getter メソッド

    pub fn id(&self) -> &WorkflowInstanceId {
        &self.id
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    pub fn definition_id(&self) -> &WorkflowDefinitionId {
        &self.definition_id
    }

    pub fn document_type(&self) -> &DocumentType {
        &self.document_type
    }

    pub fn document_id(&self) -> &DocumentId {
        &self.document_id
    }

    pub fn current_status_key(&self) -> &StatusKey {
        &self.current_status_key
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // ビジネスロジックメソッド

    /// 遷移を適用した新しいインスタンスを返す
    ///
    /// 遷移元ステータスの一致のみを検証する。ロールガード・コメント必須の
    /// 判定は操作者情報を持つエンジン層の責務。
    ///
    /// # エラー
    ///
    /// - `DomainError::Validation`: 遷移の `from_status_key` が現在
    ///   ステータスと一致しない場合
    pub fn applied(
        self,
        transition: &WorkflowTransition,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if transition.from_status_key() != &self.current_status_key {
            return Err(DomainError::Validation(format!(
                "遷移元ステータスが一致しません（現在: {}, 遷移元: {}）",
                self.current_status_key,
                transition.from_status_key()
            )));
        }

        Ok(Self {
            current_status_key: transition.to_status_key().clone(),
            version: self.version.next(),
            updated_at: now,
            ..self
        })
    }
}
