//! # 认证策略模块
//!
//! 基础认证、Bearer Token 认证以及按优先级组合它们的 Union 策略

pub mod basic;
pub mod token;
pub mod traits;
pub mod union;

// 导出核心trait
pub use traits::{AuthStrategy, TokenVerifier, UserValidator};

// 导出具体策略实现
pub use basic::CredentialStrategy;
pub use token::TokenStrategy;
pub use union::UnionStrategy;
