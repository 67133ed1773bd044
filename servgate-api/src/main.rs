mod app;

use anyhow::{bail, Context};
use app::{app_router, AppState};
use dotenvy::dotenv;
use servgate_core::{
    AccessPolicy, CommandExecutor, ExecSettings, FilePolicySource, Gateway, GatewaySettings,
    InlinePolicySource, PolicySource, SuffixMode,
};
use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_ALLOW_FILE: &str = "/opt/service-management/whitelist.txt";
const DEFAULT_DENY_FILE: &str = "/opt/service-management/blacklist.txt";
const MIN_TOKEN_LEN: usize = 16;

/// Where one policy list is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PolicyConfig {
    File(PathBuf),
    Inline(String),
}

// 日志里只写来源和条目数，不写名单内容
impl fmt::Display for PolicyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyConfig::File(path) => write!(f, "file({})", path.display()),
            PolicyConfig::Inline(list) => {
                write!(f, "inline({} entries)", PolicyConfig::inline_entries(list))
            }
        }
    }
}

impl PolicyConfig {
    /// Picks the file or inline variant; configuring both is an error.
    fn resolve(
        file: Option<String>,
        inline: Option<String>,
        default_file: &str,
        what: &str,
    ) -> anyhow::Result<Self> {
        let file = file.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        match (file, inline) {
            (Some(_), Some(_)) => {
                bail!("{what}: set either the file or the inline list, not both")
            }
            (Some(path), None) => Ok(PolicyConfig::File(PathBuf::from(path))),
            (None, Some(list)) => Ok(PolicyConfig::Inline(list)),
            (None, None) => Ok(PolicyConfig::File(PathBuf::from(default_file))),
        }
    }

    /// Non-empty comma-separated entries of an inline list.
    fn inline_entries(list: &str) -> usize {
        list.split(',').filter(|t| !t.trim().is_empty()).count()
    }

    fn into_source(self, mode: SuffixMode) -> Arc<dyn PolicySource> {
        match self {
            PolicyConfig::File(path) => Arc::new(FilePolicySource::new(path, mode)),
            PolicyConfig::Inline(list) => Arc::new(InlinePolicySource::parse(&list, mode)),
        }
    }
}

#[derive(Clone)]
struct ApiConfig {
    bind: SocketAddr,
    /// Shared secret expected in the `TOKEN` query parameter
    token: String,
    suffix_mode: SuffixMode,
    allow: PolicyConfig,
    deny: PolicyConfig,
    exec: ExecSettings,
    /// CORS origins (empty allows any)
    cors_origins: Vec<String>,
}

impl ApiConfig {
    fn from_env() -> anyhow::Result<Self> {
        let bind = match env::var("SG_BIND") {
            Ok(s) => s
                .parse()
                .with_context(|| format!("invalid SG_BIND address: {s}"))?,
            Err(_) => SocketAddr::from(([127, 0, 0, 1], 5000)),
        };

        let token = env::var("SG_TOKEN")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .context("SG_TOKEN must be set to a non-empty secret")?;
        if token.len() < MIN_TOKEN_LEN {
            warn!("SG_TOKEN is shorter than {MIN_TOKEN_LEN} bytes; use a long random value");
        }

        let suffix_mode = if env_flag("SG_REQUIRE_SUFFIX") {
            SuffixMode::Required
        } else {
            SuffixMode::Optional
        };

        let allow = PolicyConfig::resolve(
            env::var("SG_ALLOW_FILE").ok(),
            env::var("SG_ALLOW_LIST").ok(),
            DEFAULT_ALLOW_FILE,
            "allow-list",
        )?;
        let deny = PolicyConfig::resolve(
            env::var("SG_DENY_FILE").ok(),
            env::var("SG_DENY_LIST").ok(),
            DEFAULT_DENY_FILE,
            "deny-list",
        )?;

        let mut exec = ExecSettings::default();
        if let Ok(secs) = env::var("SG_COMMAND_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .with_context(|| format!("invalid SG_COMMAND_TIMEOUT_SECS: {secs}"))?;
            if secs == 0 {
                bail!("SG_COMMAND_TIMEOUT_SECS must be greater than zero");
            }
            exec.timeout = Duration::from_secs(secs);
        }
        if let Ok(helper) = env::var("SG_PRIVILEGE_HELPER") {
            exec.helper = PathBuf::from(helper.trim());
        }
        if let Ok(manager) = env::var("SG_SERVICE_MANAGER") {
            exec.manager = manager.trim().to_string();
        }

        let cors_origins = env::var("SG_CORS_ORIGINS")
            .map(|s| parse_origins(&s))
            .unwrap_or_default();

        Ok(Self {
            bind,
            token,
            suffix_mode,
            allow,
            deny,
            exec,
            cors_origins,
        })
    }

    fn into_gateway(self) -> Gateway {
        let policy = AccessPolicy::new(
            self.allow.into_source(self.suffix_mode),
            self.deny.into_source(self.suffix_mode),
        );
        Gateway::new(
            GatewaySettings {
                token: self.token,
                suffix_mode: self.suffix_mode,
            },
            policy,
            CommandExecutor::new(self.exec),
        )
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn env_flag(name: &str) -> bool {
    env::var(name).map(|v| parse_flag(&v)).unwrap_or(false)
}

/// Comma-separated origins; empty or `*` means any origin.
fn parse_origins(value: &str) -> Vec<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == "*" {
        return Vec::new();
    }
    trimmed
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    let _ = dotenv();
    init_tracing();

    let config = ApiConfig::from_env()?;
    info!(
        bind = %config.bind,
        suffix_mode = ?config.suffix_mode,
        allow = %config.allow,
        deny = %config.deny,
        helper = %config.exec.helper.display(),
        manager = %config.exec.manager,
        timeout = ?config.exec.timeout,
        "starting service gateway"
    );
    if config.cors_origins.is_empty() {
        warn!("SG_CORS_ORIGINS not configured, allowing all origins");
    }

    let bind = config.bind;
    let cors_origins = config.cors_origins.clone();
    let state = AppState {
        gateway: Arc::new(config.into_gateway()),
    };

    let app = app_router(state, cors_origins);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

fn init_tracing() {
    let filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if env_flag("SG_LOG_JSON") {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(false))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_defaults_to_file() {
        let cfg = PolicyConfig::resolve(None, None, DEFAULT_ALLOW_FILE, "allow-list").unwrap();
        assert_eq!(cfg, PolicyConfig::File(PathBuf::from(DEFAULT_ALLOW_FILE)));
    }

    #[test]
    fn policy_rejects_both_variants() {
        let err = PolicyConfig::resolve(
            Some("/tmp/deny.txt".into()),
            Some("nginx".into()),
            DEFAULT_DENY_FILE,
            "deny-list",
        )
        .unwrap_err();
        assert!(err.to_string().contains("deny-list"));
    }

    #[test]
    fn policy_inline_variant() {
        let cfg =
            PolicyConfig::resolve(None, Some("nginx,redis".into()), DEFAULT_ALLOW_FILE, "allow")
                .unwrap();
        assert_eq!(cfg, PolicyConfig::Inline("nginx,redis".into()));
        let units: Vec<String> = cfg
            .into_source(SuffixMode::Optional)
            .load()
            .into_iter()
            .map(|u| u.to_string())
            .collect();
        assert_eq!(units, vec!["nginx.service", "redis.service"]);
    }

    #[test]
    fn policy_display_hides_entries() {
        let inline = PolicyConfig::Inline("nginx, secret-backup ,".into());
        assert_eq!(inline.to_string(), "inline(2 entries)");
        let file = PolicyConfig::File(PathBuf::from(DEFAULT_DENY_FILE));
        assert_eq!(
            file.to_string(),
            "file(/opt/service-management/blacklist.txt)"
        );
    }

    #[test]
    fn blank_file_variable_falls_back_to_inline() {
        let cfg = PolicyConfig::resolve(Some("  ".into()), Some("x".into()), DEFAULT_ALLOW_FILE, "a")
            .unwrap();
        assert_eq!(cfg, PolicyConfig::Inline("x".into()));
    }

    #[test]
    fn flags_and_origins() {
        assert!(parse_flag("TRUE"));
        assert!(parse_flag(" 1 "));
        assert!(!parse_flag("no"));
        assert!(parse_origins("*").is_empty());
        assert_eq!(
            parse_origins("https://a.example, https://b.example,"),
            vec!["https://a.example", "https://b.example"]
        );
    }
}
