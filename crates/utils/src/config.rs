use serde::{Deserialize, Serialize};

#[derive(clap::ValueEnum, Clone, Debug, Copy, PartialEq, Eq)]
#[clap(rename_all = "lowercase")]
pub enum CargoEnv {
    Development,
    Production,
}

impl From<&str> for CargoEnv {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => CargoEnv::Production,
            _ => CargoEnv::Development,
        }
    }
}

/// 派生数据的存储后端
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// MongoDB（生产环境）
    #[serde(rename = "mongo")]
    #[default]
    Mongo,
    /// 进程内存（测试 / 演练）
    #[serde(rename = "memory")]
    Memory,
}

impl From<&str> for StoreBackend {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "memory" | "mem" | "in-memory" => StoreBackend::Memory,
            _ => StoreBackend::Mongo,
        }
    }
}

/// 环境配置加载器
pub struct EnvLoader;

impl EnvLoader {
    /// 根据 CARGO_ENV 选择对应的环境配置文件名
    pub fn env_file_for(cargo_env: &str) -> &'static str {
        match cargo_env {
            "production" | "Production" | "prod" => ".env.production",
            "development" | "Development" | "dev" => ".env.development",
            "test" | "Test" => ".env.test",
            _ => ".env.development",
        }
    }

    /// 根据 CARGO_ENV 加载对应的环境配置文件
    pub fn load_env_file() -> Result<(), Box<dyn std::error::Error>> {
        let cargo_env = std::env::var("CARGO_ENV").unwrap_or_else(|_| "development".to_string());
        let env_file = Self::env_file_for(&cargo_env);

        if !std::path::Path::new(env_file).exists() {
            eprintln!("⚠️  配置文件 {} 不存在，尝试加载默认的 .env 文件", env_file);
            if std::path::Path::new(".env").exists() {
                dotenvy::from_filename(".env")?;
                println!("✅ 已加载默认配置文件: .env");
            } else {
                eprintln!("❌ 未找到任何配置文件，使用默认配置");
            }
            return Ok(());
        }

        dotenvy::from_filename(env_file)?;
        println!("✅ 已加载环境配置文件: {} (CARGO_ENV={})", env_file, cargo_env);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_file_selection() {
        assert_eq!(EnvLoader::env_file_for("prod"), ".env.production");
        assert_eq!(EnvLoader::env_file_for("Test"), ".env.test");
        assert_eq!(EnvLoader::env_file_for("whatever"), ".env.development");
    }

    #[test]
    fn test_store_backend_parsing() {
        assert_eq!(StoreBackend::from("memory"), StoreBackend::Memory);
        assert_eq!(StoreBackend::from("MONGO"), StoreBackend::Mongo);
        assert_eq!(StoreBackend::from(""), StoreBackend::Mongo);
    }
}
