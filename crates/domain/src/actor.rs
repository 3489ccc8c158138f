//! # 操作者（Actor）
//!
//! 遷移を要求する認証済みユーザーのドメイン表現。
//!
//! ## 設計方針
//!
//! 認証・認可のフロー自体はこのエンジンの責務外であり、
//! 上位層が認証済みユーザーから `Actor` を組み立てて渡す。
//! エンジンが参照するのは「テナント内で保持しているロールの集合」のみで、
//! 遷移のロールガード判定に使用する。

use crate::value_objects::RoleKey;

define_uuid_id! {
    /// ユーザーの一意識別子
    pub struct UserId;
}

/// 遷移を要求する操作者
///
/// 対象テナント内でのロール保持状態を持つ。
/// ロールガード付きの遷移は、操作者がそのロールを保持している場合のみ
/// 適用可能になる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    user_id: UserId,
    roles:   Vec<RoleKey>,
}

impl Actor {
    /// 操作者を作成する
    pub fn new(user_id: UserId, roles: Vec<RoleKey>) -> Self {
        Self { user_id, roles }
    }

    /// ユーザー ID を取得する
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// 保持しているロールの一覧を取得する
    pub fn roles(&self) -> &[RoleKey] {
        &self.roles
    }

    /// 指定したロールを保持しているか判定する
    pub fn has_role(&self, role: &RoleKey) -> bool {
        self.roles.contains(role)
    }
}
