//! # 静态用户校验
//!
//! 由配置构建的内存用户表，密码以 bcrypt 哈希保存

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::debug;

use crate::auth::strategies::UserValidator;
use crate::auth::types::Identity;
use crate::config::UserEntry;
use crate::error::{Result, StrategyError};

struct StoredUser {
    password_hash: String,
    identity: Identity,
}

/// 基于配置的用户名/密码校验器
pub struct StaticUserValidator {
    users: HashMap<String, StoredUser>,
}

impl StaticUserValidator {
    /// Build the user table. Plaintext passwords are hashed with `cost`.
    pub fn from_config(entries: &[UserEntry], cost: u32) -> Result<Self> {
        let mut users = HashMap::with_capacity(entries.len());

        for entry in entries {
            let password_hash = match (&entry.password_hash, &entry.password) {
                (Some(hash), _) => hash.clone(),
                (None, Some(plain)) => bcrypt::hash(plain, cost)?,
                (None, None) => {
                    return Err(crate::config_error!(
                        "user '{}' has no password",
                        entry.username
                    ));
                }
            };

            let mut identity = Identity::new(entry.username.clone())
                .map_err(|e| crate::error::GateError::config_with_source("invalid user entry", e))?
                .with_groups(entry.groups.iter().cloned());
            if let Some(id) = &entry.id {
                identity = identity.with_id(id.clone());
            }

            users.insert(
                entry.username.clone(),
                StoredUser {
                    password_hash,
                    identity,
                },
            );
        }

        debug!(count = users.len(), "static user table loaded");
        Ok(Self { users })
    }

    /// 已加载的用户数量
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// 用户表是否为空
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserValidator for StaticUserValidator {
    async fn validate(&self, username: &str, password: &str) -> std::result::Result<Identity, StrategyError> {
        let user = self
            .users
            .get(username)
            .ok_or(StrategyError::InvalidCredentials)?;

        // 哈希格式错误按凭据无效处理
        match bcrypt::verify(password, &user.password_hash) {
            Ok(true) => Ok(user.identity.clone()),
            Ok(false) => Err(StrategyError::InvalidCredentials),
            Err(e) => {
                debug!(username, error = %e, "stored password hash could not be verified");
                Err(StrategyError::InvalidCredentials)
            }
        }
    }
}
