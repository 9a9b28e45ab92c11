use anyhow::{bail, Context, Result};

/// Which concrete store backend to read from. The agent decides where it
/// writes; the dashboard just follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite,
    Supabase,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: StoreBackend,
    pub db_path: String,
    pub port: u16,
    pub supabase_url: String,
    pub supabase_anon_key: String,
}

impl Config {
    /// Load config from a specific .env file, or the default `.env` if None.
    pub fn from_env_file(path: Option<&str>) -> Result<Self> {
        match path {
            Some(p) => { dotenvy::from_filename(p).ok(); }
            None => { dotenvy::dotenv().ok(); }
        }
        Self::build_from_env()
    }

    fn build_from_env() -> Result<Self> {
        let backend = match env("STORE_BACKEND", "sqlite").as_str() {
            "sqlite" => StoreBackend::Sqlite,
            "supabase" => StoreBackend::Supabase,
            other => bail!("STORE_BACKEND must be 'sqlite' or 'supabase', got '{other}'"),
        };

        let supabase_url = env("SUPABASE_URL", "");
        let supabase_anon_key = env("SUPABASE_ANON_KEY", "");
        if backend == StoreBackend::Supabase {
            if supabase_url.is_empty() {
                bail!("SUPABASE_URL is required when STORE_BACKEND=supabase");
            }
            if supabase_anon_key.is_empty() {
                bail!("SUPABASE_ANON_KEY is required when STORE_BACKEND=supabase");
            }
        }

        Ok(Self {
            backend,
            db_path: env("DATABASE_PATH", "strategies.db"),
            port: env("DASHBOARD_PORT", "3000")
                .parse()
                .context("DASHBOARD_PORT must be a valid u16")?,
            supabase_url,
            supabase_anon_key,
        })
    }
}

fn env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
