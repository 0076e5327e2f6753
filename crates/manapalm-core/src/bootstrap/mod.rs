use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use manapalm_common::{GlobalConfig, GlobalConfigPatch, ProviderEndpoint};
use manapalm_provider_core::{ProviderKind, ProviderSettings};
use manapalm_provider_impl::build_registry;

use crate::core::Core;
use crate::cors::CorsConfig;
use crate::identity::{QuotaResolver, SupabaseIdentity};
use crate::proxy_engine::ProxyEngine;
use crate::upstream_client::{UpstreamClient, UpstreamClientConfig, WreqUpstreamClient};

#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "manapalm",
    version,
    about = "AI request router for the Nakhlestan Mana storefront"
)]
pub struct CliArgs {
    /// Bind host.
    #[arg(long, env = "MANAPALM_HOST")]
    pub host: Option<String>,

    /// Bind port.
    #[arg(long, env = "MANAPALM_PORT")]
    pub port: Option<String>,

    /// Optional outbound proxy for upstream requests.
    #[arg(long, env = "MANAPALM_PROXY")]
    pub proxy: Option<String>,

    /// Comma separated CORS origin allow-list.
    #[arg(long, env = "MANAPALM_ALLOWED_ORIGINS")]
    pub allowed_origins: Option<String>,

    /// Extra attempts for the retry-wrapped provider (openrouter).
    #[arg(long, env = "MANAPALM_MAX_RETRIES")]
    pub max_retries: Option<String>,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[arg(long, env = "OPENAI_BASE_URL")]
    pub openai_base_url: Option<String>,

    #[arg(long, env = "OPENAI_MODEL")]
    pub openai_model: Option<String>,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    #[arg(long, env = "GEMINI_BASE_URL")]
    pub gemini_base_url: Option<String>,

    #[arg(long, env = "GEMINI_MODEL")]
    pub gemini_model: Option<String>,

    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    pub openrouter_api_key: Option<String>,

    #[arg(long, env = "OPENROUTER_BASE_URL")]
    pub openrouter_base_url: Option<String>,

    #[arg(long, env = "OPENROUTER_MODEL")]
    pub openrouter_model: Option<String>,

    /// Model for the single fallback attempt on openrouter.
    #[arg(long, env = "MANAPALM_FALLBACK_MODEL")]
    pub fallback_model: Option<String>,

    /// Supabase project URL; unset disables identity lookups.
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: Option<String>,

    #[arg(long, env = "SUPABASE_SERVICE_ROLE_KEY", hide_env_values = true)]
    pub supabase_service_key: Option<String>,
}

pub struct Bootstrap {
    pub config: GlobalConfig,
    pub core: Core,
}

pub fn bootstrap_from_env() -> anyhow::Result<Bootstrap> {
    let args = CliArgs::parse();
    bootstrap(args)
}

pub fn bootstrap(args: CliArgs) -> anyhow::Result<Bootstrap> {
    let config = load_config(args)?;
    let core = build_core(&config)?;
    Ok(Bootstrap { config, core })
}

/// clap already applies CLI > ENV per field; built-in defaults fill the rest.
pub fn load_config(args: CliArgs) -> anyhow::Result<GlobalConfig> {
    let patch = GlobalConfigPatch {
        host: sanitize_optional_env_value(args.host),
        port: parse_u16_env_value(args.port, "MANAPALM_PORT")?,
        proxy: sanitize_optional_env_value(args.proxy),
        allowed_origins: parse_list_env_value(args.allowed_origins),
        max_retries: parse_u32_env_value(args.max_retries, "MANAPALM_MAX_RETRIES")?,
        openai: endpoint(args.openai_api_key, args.openai_base_url, args.openai_model),
        google: endpoint(args.gemini_api_key, args.gemini_base_url, args.gemini_model),
        openrouter: endpoint(
            args.openrouter_api_key,
            args.openrouter_base_url,
            args.openrouter_model,
        ),
        fallback_model: sanitize_optional_env_value(args.fallback_model),
        supabase_url: sanitize_optional_env_value(args.supabase_url),
        supabase_service_key: sanitize_optional_env_value(args.supabase_service_key),
    };

    patch.into_config().context("finalize merged global config")
}

pub fn build_core(config: &GlobalConfig) -> anyhow::Result<Core> {
    let client = WreqUpstreamClient::new(UpstreamClientConfig::from_global(config))
        .context("build upstream http client")?;
    Ok(assemble_core(config, Arc::new(client)))
}

/// Wires the router around an existing client; identity lookups share it.
pub fn assemble_core(config: &GlobalConfig, client: Arc<dyn UpstreamClient>) -> Core {
    let settings = HashMap::from([
        (
            ProviderKind::OpenAI,
            provider_settings(&config.openai, config.max_retries),
        ),
        (
            ProviderKind::Google,
            provider_settings(&config.google, config.max_retries),
        ),
        (
            ProviderKind::OpenRouter,
            provider_settings(&config.openrouter, config.max_retries),
        ),
    ]);
    let engine = ProxyEngine::new(
        client.clone(),
        Arc::new(build_registry()),
        settings,
        config.fallback_model.clone(),
    );
    let quota = match &config.identity {
        Some(backend) => {
            QuotaResolver::new(Arc::new(SupabaseIdentity::new(client, backend.clone())))
        }
        None => QuotaResolver::disabled(),
    };
    Core::new(engine, quota, CorsConfig::new(config.allowed_origins.clone()))
}

fn provider_settings(endpoint: &ProviderEndpoint, max_retries: u32) -> ProviderSettings {
    ProviderSettings {
        api_key: endpoint.api_key.clone(),
        base_url: endpoint.base_url.clone(),
        model: endpoint.model.clone(),
        max_retries,
    }
}

fn endpoint(
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
) -> ProviderEndpoint {
    ProviderEndpoint {
        api_key: sanitize_optional_env_value(api_key),
        base_url: sanitize_optional_env_value(base_url),
        model: sanitize_optional_env_value(model),
    }
}

fn sanitize_optional_env_value(value: Option<String>) -> Option<String> {
    let trimmed = value?.trim().to_string();
    if trimmed.is_empty() {
        return None;
    }
    // Unresolved `${VAR}` placeholders from deploy templates count as unset.
    if trimmed.starts_with("${") && trimmed.ends_with('}') {
        return None;
    }
    Some(trimmed)
}

fn parse_list_env_value(value: Option<String>) -> Option<Vec<String>> {
    let raw = sanitize_optional_env_value(value)?;
    let items: Vec<String> = raw
        .split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();
    if items.is_empty() {
        return None;
    }
    Some(items)
}

fn parse_u16_env_value(value: Option<String>, env_name: &str) -> anyhow::Result<Option<u16>> {
    let Some(raw) = sanitize_optional_env_value(value) else {
        return Ok(None);
    };
    let parsed = raw
        .parse::<u16>()
        .with_context(|| format!("invalid {env_name} value: {raw}"))?;
    Ok(Some(parsed))
}

fn parse_u32_env_value(value: Option<String>, env_name: &str) -> anyhow::Result<Option<u32>> {
    let Some(raw) = sanitize_optional_env_value(value) else {
        return Ok(None);
    };
    let parsed = raw
        .parse::<u32>()
        .with_context(|| format!("invalid {env_name} value: {raw}"))?;
    Ok(Some(parsed))
}
