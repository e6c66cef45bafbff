//! # 配置管理模块
//!
//! 处理应用配置加载、环境变量覆盖和验证

mod app_config;

pub use app_config::{
    AppConfig, AuthConfig, CacheConfig, CorsConfig, ServerConfig, TokenConfig, UserEntry,
};

use std::env;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{GateError, Result};

/// 配置文件路径环境变量
pub const CONFIG_PATH_ENV: &str = "AUTH_GATE_CONFIG_PATH";
/// 端口覆盖环境变量
pub const PORT_ENV: &str = "PORT";
/// JWT 密钥覆盖环境变量
pub const JWT_SECRET_ENV: &str = "AUTH_GATE_JWT_SECRET";

const DEFAULT_CONFIG_FILE: &str = "config/config.toml";

/// 加载配置
///
/// Lookup order: explicit path, then `AUTH_GATE_CONFIG_PATH`, then
/// `config/config.toml` if it exists, then built-in defaults. Environment
/// overrides are applied afterwards and the result is validated.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    let mut config = match resolve_config_path(explicit) {
        Some(path) => {
            info!(path = %path.display(), "loading configuration file");
            load_config_file(&path)?
        }
        None => {
            info!("no configuration file found, using defaults");
            AppConfig::default()
        }
    };

    apply_env_overrides(&mut config, |key| env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

/// 读取并解析单个 TOML 配置文件
pub fn load_config_file(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        GateError::config_with_source(format!("读取配置文件失败: {}", path.display()), e)
    })?;
    Ok(toml::from_str(&content)?)
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = env::var(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(path));
    }
    let default = Path::new(DEFAULT_CONFIG_FILE);
    default.exists().then(|| default.to_path_buf())
}

/// Apply environment overrides through `lookup` so tests need not touch the
/// process environment.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = lookup(PORT_ENV) {
        config.server.port = port
            .trim()
            .parse()
            .map_err(|e| GateError::config_with_source(format!("无效的端口: {port}"), e))?;
        debug!(port = config.server.port, "port overridden from environment");
    }

    if let Some(secret) = lookup(JWT_SECRET_ENV) {
        config.auth.token.secret = secret;
        debug!("JWT secret overridden from environment");
    }

    Ok(())
}
