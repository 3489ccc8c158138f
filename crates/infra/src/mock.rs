//! # テスト用モックリポジトリ
//!
//! エンジン層のテストで使用するインメモリモックリポジトリ。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! docflow-infra = { workspace = true, features = ["test-utils"] }
//! ```
//!
//! Postgres 実装が DB の制約で保証する性質（文書ごとの一意性、
//! バージョン一致チェック）をインメモリで再現する。

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use docflow_domain::{
    tenant::TenantId,
    value_objects::{DocumentType, Version},
    workflow::{
        DocumentId,
        WorkflowDefinition,
        WorkflowDefinitionId,
        WorkflowHistoryEntry,
        WorkflowInstance,
        WorkflowInstanceId,
    },
};

use crate::{
    db::{TransactionManager, TxContext},
    error::InfraError,
    repository::{
        WorkflowDefinitionRepository,
        WorkflowHistoryRepository,
        WorkflowInstanceRepository,
    },
};

// ===== MockWorkflowDefinitionRepository =====

#[derive(Clone, Default)]
pub struct MockWorkflowDefinitionRepository {
    definitions: Arc<Mutex<Vec<WorkflowDefinition>>>,
}

impl MockWorkflowDefinitionRepository {
    pub fn new() -> Self {
        Self {
            definitions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// トランザクションを経由せず定義を直接登録する（テストのセットアップ用）
    pub fn add_definition(&self, def: WorkflowDefinition) {
        self.definitions.lock().unwrap().push(def);
    }
}

#[async_trait]
impl WorkflowDefinitionRepository for MockWorkflowDefinitionRepository {
    async fn insert(
        &self,
        _tx: &mut TxContext,
        definition: &WorkflowDefinition,
    ) -> Result<(), InfraError> {
        let mut definitions = self.definitions.lock().unwrap();
        let duplicate_default = definition.is_default()
            && definition.is_active()
            && definitions.iter().any(|d| {
                d.tenant_id() == definition.tenant_id()
                    && d.document_type() == definition.document_type()
                    && d.is_default()
                    && d.is_active()
            });
        if duplicate_default {
            return Err(InfraError::conflict(
                "WorkflowDefinition",
                definition.id().to_string(),
            ));
        }
        definitions.push(definition.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &WorkflowDefinitionId,
        tenant_id: &TenantId,
    ) -> Result<Option<WorkflowDefinition>, InfraError> {
        Ok(self
            .definitions
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.id() == id && d.tenant_id() == tenant_id)
            .cloned())
    }

    async fn find_default_active(
        &self,
        tenant_id: &TenantId,
        document_type: &DocumentType,
    ) -> Result<Option<WorkflowDefinition>, InfraError> {
        Ok(self
            .definitions
            .lock()
            .unwrap()
            .iter()
            .find(|d| {
                d.tenant_id() == tenant_id
                    && d.document_type() == document_type
                    && d.is_default()
                    && d.is_active()
            })
            .cloned())
    }
}

// ===== MockWorkflowInstanceRepository =====

#[derive(Clone, Default)]
pub struct MockWorkflowInstanceRepository {
    instances: Arc<Mutex<Vec<WorkflowInstance>>>,
}

impl MockWorkflowInstanceRepository {
    pub fn new() -> Self {
        Self {
            instances: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl WorkflowInstanceRepository for MockWorkflowInstanceRepository {
    async fn insert(
        &self,
        _tx: &mut TxContext,
        instance: &WorkflowInstance,
    ) -> Result<(), InfraError> {
        let mut instances = self.instances.lock().unwrap();
        // (tenant_id, document_type, document_id) の一意制約を再現する
        let duplicate = instances.iter().any(|i| {
            i.tenant_id() == instance.tenant_id()
                && i.document_type() == instance.document_type()
                && i.document_id() == instance.document_id()
        });
        if duplicate {
            return Err(InfraError::conflict(
                "WorkflowInstance",
                instance.id().to_string(),
            ));
        }
        instances.push(instance.clone());
        Ok(())
    }

    async fn update_with_version_check(
        &self,
        _tx: &mut TxContext,
        instance: &WorkflowInstance,
        expected_version: Version,
    ) -> Result<(), InfraError> {
        let mut instances = self.instances.lock().unwrap();
        // 行が存在しない・バージョン不一致はどちらも「更新 0 行」（Postgres 実装と同じ扱い）
        let Some(pos) = instances
            .iter()
            .position(|i| i.id() == instance.id() && i.tenant_id() == instance.tenant_id())
        else {
            return Err(InfraError::conflict(
                "WorkflowInstance",
                instance.id().to_string(),
            ));
        };
        if instances[pos].version() != expected_version {
            return Err(InfraError::conflict(
                "WorkflowInstance",
                instance.id().to_string(),
            ));
        }
        instances[pos] = instance.clone();
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &WorkflowInstanceId,
        tenant_id: &TenantId,
    ) -> Result<Option<WorkflowInstance>, InfraError> {
        Ok(self
            .instances
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id() == id && i.tenant_id() == tenant_id)
            .cloned())
    }

    async fn find_by_document(
        &self,
        tenant_id: &TenantId,
        document_type: &DocumentType,
        document_id: &DocumentId,
    ) -> Result<Option<WorkflowInstance>, InfraError> {
        Ok(self
            .instances
            .lock()
            .unwrap()
            .iter()
            .find(|i| {
                i.tenant_id() == tenant_id
                    && i.document_type() == document_type
                    && i.document_id() == document_id
            })
            .cloned())
    }
}

// ===== MockWorkflowHistoryRepository =====

#[derive(Clone, Default)]
pub struct MockWorkflowHistoryRepository {
    entries: Arc<Mutex<Vec<WorkflowHistoryEntry>>>,
}

impl MockWorkflowHistoryRepository {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl WorkflowHistoryRepository for MockWorkflowHistoryRepository {
    async fn insert(
        &self,
        _tx: &mut TxContext,
        entry: &WorkflowHistoryEntry,
    ) -> Result<(), InfraError> {
        let mut entries = self.entries.lock().unwrap();
        entries.push(entry.clone());
        Ok(())
    }

    async fn find_by_instance(
        &self,
        instance_id: &WorkflowInstanceId,
        tenant_id: &TenantId,
    ) -> Result<Vec<WorkflowHistoryEntry>, InfraError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.instance_id() == instance_id && e.tenant_id() == tenant_id)
            .cloned()
            .collect())
    }
}

// ===== MockTransactionManager =====

/// テスト用 TransactionManager 実装
///
/// Mock リポジトリはインメモリ実装のため、実際のトランザクションは開始しない。
/// コミット・ロールバックのセマンティクスは再現されない点に注意。
#[derive(Clone, Default)]
pub struct MockTransactionManager;

impl MockTransactionManager {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TransactionManager for MockTransactionManager {
    async fn begin(&self) -> Result<TxContext, InfraError> {
        Ok(TxContext::mock())
    }
}
