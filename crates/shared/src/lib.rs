//! # DocFlow 共有ユーティリティ
//!
//! このクレートは、DocFlow
//! プロジェクト全体で使用される共通ユーティリティを提供する。
//!
//! ## 設計方針
//!
//! - どのレイヤーからも依存できる最下層のクレート
//! - ビジネスロジックを含まない純粋なユーティリティのみを配置
//! - 外部クレートへの依存は最小限に抑える

pub mod event_log;
pub mod observability;
