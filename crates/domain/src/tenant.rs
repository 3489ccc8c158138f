//! # テナント
//!
//! マルチテナント ERP におけるテナント（顧客企業）の識別子。
//!
//! ## 設計判断
//!
//! 元システムはリクエストスコープのグローバル状態（「現在の会社」
//! シングルトン）からテナントを解決していたが、本実装ではテナント ID を
//! ワークフローサービスの公開メソッドの明示的な引数として渡す。
//! これによりサービスが純粋になり、リクエストコンテキストなしで
//! テスト可能になる。
//!
//! ワークフローのすべてのデータ（定義・インスタンス・履歴）は
//! この `TenantId` でスコープされ、テナント間のデータ分離を保証する。

define_uuid_id! {
    /// テナント（顧客企業）の一意識別子
    ///
    /// UUID v7 を使用するため生成順にソート可能。
    /// 認証基盤から取得し、クライアントからの直接指定は受け付けない。
    pub struct TenantId;
}
