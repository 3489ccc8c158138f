//! # 共通値オブジェクト
//!
//! 複数のエンティティで共有される値オブジェクトを定義する。
//!
//! ## 設計方針
//!
//! - **Newtype パターン**: プリミティブ型をラップし、型安全性を確保
//! - **バリデーション**: 生成時に検証し、不正な値の存在を型レベルで排除
//! - **開放的なキー空間**: 文書種別やステータスは管理者が設定するため、
//!   閉じた enum ではなくバリデーション付き文字列キーとして表現する
//!
//! ## 含まれる型
//!
//! | 型 | ラップ対象 | 用途 |
//! |---|-----------|------|
//! | [`Version`] | `u32` | 楽観的ロック用のバージョン番号 |
//! | [`DocumentType`] | `String` | 業務文書の種別キー（`purchase_order` など） |
//! | [`StatusKey`] | `String` | ワークフローステータスのキー（`draft` など） |
//! | [`RoleKey`] | `String` | 遷移ガードのロールキー（`manager` など） |
//! | [`WorkflowName`] | `String` | ワークフロー定義の表示名 |
//! | [`TransitionComment`] | `String` | 遷移時の操作者コメント |

use serde::{Deserialize, Serialize};

use crate::DomainError;

// =========================================================================
// Version（バージョン番号）
// =========================================================================

/// バージョン番号（値オブジェクト）
///
/// ワークフローインスタンスの楽観的ロックに使用。
/// 1 から始まり、遷移が適用されるたびにインクリメントされる。
///
/// # 使用例
///
/// ```rust
/// use docflow_domain::value_objects::Version;
///
/// let v1 = Version::initial();
/// assert_eq!(v1.as_u32(), 1);
///
/// let v2 = v1.next();
/// assert_eq!(v2.as_u32(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version(u32);

impl Version {
    /// 初期バージョン（1）を作成する
    pub fn initial() -> Self {
        Self(1)
    }

    /// 指定した値からバージョンを作成する
    ///
    /// # エラー
    ///
    /// 0 は無効（バージョンは 1 以上）。
    pub fn new(value: u32) -> Result<Self, DomainError> {
        if value == 0 {
            return Err(DomainError::Validation(
                "バージョン番号は 1 以上である必要があります".to_string(),
            ));
        }
        Ok(Self(value))
    }

    /// 次のバージョンを返す
    ///
    /// # パニック
    ///
    /// u32 の最大値を超える場合はパニックする。実運用では到達しない想定。
    pub fn next(&self) -> Self {
        Self(
            self.0
                .checked_add(1)
                .expect("バージョン番号がオーバーフローしました"),
        )
    }

    /// 内部の u32 値を取得する
    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// i32 に変換する（DB 互換用）
    ///
    /// # パニック
    ///
    /// i32 の範囲を超える場合はパニックする。
    pub fn as_i32(&self) -> i32 {
        i32::try_from(self.0).expect("バージョン番号が i32 の範囲を超えています")
    }
}

impl TryFrom<i32> for Version {
    type Error = DomainError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        if value <= 0 {
            return Err(DomainError::Validation(
                "バージョン番号は 1 以上である必要があります".to_string(),
            ));
        }
        Ok(Self(value as u32))
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::initial()
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

// =========================================================================
// 設定キー（DocumentType / StatusKey / RoleKey）
// =========================================================================

define_key_string! {
    /// 業務文書の種別キー（値オブジェクト）
    ///
    /// どの種類の業務レコード（発注書、受注書など）にワークフローが
    /// 適用されるかを識別する。例: `purchase_order`, `sales_order`。
    ///
    /// # バリデーション
    ///
    /// - 空文字列ではない
    /// - 最大 100 文字
    /// - 英小文字・数字・アンダースコアのみ
    pub struct DocumentType {
        label: "文書種別キー",
        max_length: 100,
    }
}

define_key_string! {
    /// ワークフローステータスのキー（値オブジェクト）
    ///
    /// 定義内でステートマシンの状態を識別する。例: `draft`, `approved`。
    pub struct StatusKey {
        label: "ステータスキー",
        max_length: 100,
    }
}

define_key_string! {
    /// ロールキー（値オブジェクト）
    ///
    /// 遷移のロールガードと操作者の保持ロールを表現する。
    /// 例: `manager`, `accountant`。
    pub struct RoleKey {
        label: "ロールキー",
        max_length: 100,
    }
}

// =========================================================================
// WorkflowName（ワークフロー名）
// =========================================================================

/// ワークフロー名（値オブジェクト）
///
/// ワークフロー定義の表示名を表現する。
///
/// # バリデーション
///
/// - 空文字列ではない
/// - 最大 200 文字
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowName(String);

impl WorkflowName {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_string();

        if value.is_empty() {
            return Err(DomainError::Validation(
                "ワークフロー名は必須です".to_string(),
            ));
        }

        if value.chars().count() > 200 {
            return Err(DomainError::Validation(
                "ワークフロー名は 200 文字以内である必要があります".to_string(),
            ));
        }

        Ok(Self(value))
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 所有権を持つ文字列に変換する
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for WorkflowName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =========================================================================
// TransitionComment（遷移コメント）
// =========================================================================

/// 遷移時の操作者コメント（値オブジェクト）
///
/// 遷移定義が `requires_comment` を要求する場合、空のコメントは
/// 拒否される。空白のみの入力はコメントなしとして扱う。
///
/// # 使用例
///
/// ```rust
/// use docflow_domain::value_objects::TransitionComment;
///
/// // 空白のみの入力は None に正規化される
/// assert!(TransitionComment::from_input(Some("   ".to_string())).is_none());
///
/// let comment = TransitionComment::from_input(Some("承認します".to_string())).unwrap();
/// assert_eq!(comment.as_str(), "承認します");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionComment(String);

impl TransitionComment {
    /// 任意入力からコメントを正規化する
    ///
    /// trim 後に空になる入力は「コメントなし」（`None`）として扱う。
    /// コメント必須判定はエンジン層で行う。
    pub fn from_input(value: Option<String>) -> Option<Self> {
        let value = value?.trim().to_string();
        if value.is_empty() {
            return None;
        }
        Some(Self(value))
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 所有権を持つ文字列に変換する
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for TransitionComment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =========================================================================
// テスト
// =========================================================================
