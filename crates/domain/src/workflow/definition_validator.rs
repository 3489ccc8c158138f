//! # ワークフロー定義バリデーション
//!
//! 定義の構造的な不変条件を検証する。
//! 定義は管理者が設定するデータであり、構築時と DB 復元時の両方で
//! 検証することで、壊れたステートマシンがエンジンに到達することを防ぐ。

use std::collections::HashSet;

use crate::{
    DomainError,
    workflow::definition::{WorkflowStatus, WorkflowTransition},
};

/// 定義のステータス・遷移集合を検証する
///
/// ## 検証項目
///
/// 1. ステータスが 1 件以上ある
/// 2. ステータスキーが定義内で一意
/// 3. `is_initial` なステータスがちょうど 1 件
/// 4. 遷移 ID が一意
/// 5. すべての遷移の両端が定義内のステータスを参照する
///
/// # エラー
///
/// 違反を検出した場合は `DomainError::Validation` を返す。
pub fn validate_definition(
    statuses: &[WorkflowStatus],
    transitions: &[WorkflowTransition],
) -> Result<(), DomainError> {
    if statuses.is_empty() {
        return Err(DomainError::Validation(
            "ワークフロー定義には 1 件以上のステータスが必要です".to_string(),
        ));
    }

    let mut keys = HashSet::new();
    for status in statuses {
        if !keys.insert(status.key()) {
            return Err(DomainError::Validation(format!(
                "ステータスキーが重複しています: {}",
                status.key()
            )));
        }
    }

    let initial_count = statuses.iter().filter(|s| s.is_initial()).count();
    if initial_count != 1 {
        return Err(DomainError::Validation(format!(
            "初期ステータスはちょうど 1 件必要です（現在: {} 件）",
            initial_count
        )));
    }

    let mut transition_ids = HashSet::new();
    for transition in transitions {
        if !transition_ids.insert(transition.id()) {
            return Err(DomainError::Validation(format!(
                "遷移 ID が重複しています: {}",
                transition.id()
            )));
        }

        for endpoint in [transition.from_status_key(), transition.to_status_key()] {
            if !keys.contains(endpoint) {
                return Err(DomainError::Validation(format!(
                    "遷移「{}」が未定義のステータスを参照しています: {}",
                    transition.label(),
                    endpoint
                )));
            }
        }
    }

    Ok(())
}
