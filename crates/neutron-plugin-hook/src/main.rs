// # neutron-plugin-hook - Hook runner
//
// Thin integration layer executing one relation hook for the provides side
// of the neutron-plugin interface. All relation logic lives in
// neutron-plugin-core; this binary only:
// 1. Reads configuration from environment variables
// 2. Loads the relation snapshot
// 3. Routes the hook name through the registration table
// 4. Writes the snapshot back
//
// ## Configuration
//
// ### Hook context
// - `JUJU_HOOK_NAME`: Hook being executed (required)
// - `JUJU_REMOTE_UNIT`: Remote unit of a relation hook
//
// ### Relation
// - `NEUTRON_PLUGIN_RELATION_NAME`: Relation name (default: neutron-plugin)
// - `NEUTRON_PLUGIN_SCOPE`: global, service or unit (default: global)
// - `NEUTRON_PLUGIN_STATE_PATH`: Relation snapshot JSON (required)
// - `NEUTRON_PLUGIN_ADDRESS_KEY`: Remote address key (default: private-address)
//
// ### Data exchange
// - `NEUTRON_PLUGIN_NAME` / `NEUTRON_PLUGIN_CONFIG`: Plugin name and JSON
//   object sent once the relation is connected
// - `NEUTRON_PLUGIN_SEND_KEY_INFO`: Broadcast RNDC key info when "true"
// - `NEUTRON_PLUGIN_RNDC_KEY_PATH`: Key file (default: /etc/bind/rndc.key)
//
// ### Logging
// - `NEUTRON_PLUGIN_LOG_LEVEL`: trace, debug, info, warn or error
//
// ## Example
//
// ```bash
// export JUJU_HOOK_NAME=neutron-plugin-relation-joined
// export JUJU_REMOTE_UNIT=nova-compute/0
// export NEUTRON_PLUGIN_STATE_PATH=/var/lib/neutron-plugin/relation.json
// export NEUTRON_PLUGIN_NAME=ovs
// export NEUTRON_PLUGIN_CONFIG='{"nova-compute": {}}'
//
// neutron-plugin-hook
// ```

use anyhow::{Context, Result};
use neutron_plugin_core::{
    HookRegistry, MemoryRelation, NeutronPluginProvides, ProvidesConfig, ProvidesHook,
    RelationSnapshot, Scope,
};
use serde_json::{Map, Value};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: Hook handled (or not ours to handle)
/// - 1: Configuration error
/// - 2: Runtime error
#[derive(Debug, Clone, Copy)]
enum HookExitCode {
    /// Hook completed
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<HookExitCode> for ExitCode {
    fn from(code: HookExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    hook_name: String,
    remote_unit: Option<String>,
    relation_name: String,
    scope: String,
    state_path: PathBuf,
    rndc_key_path: Option<PathBuf>,
    address_key: Option<String>,
    plugin_name: Option<String>,
    plugin_config: Option<String>,
    send_key_info: bool,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            hook_name: env::var("JUJU_HOOK_NAME").context("JUJU_HOOK_NAME is not set")?,
            remote_unit: env::var("JUJU_REMOTE_UNIT").ok().filter(|u| !u.is_empty()),
            relation_name: env::var("NEUTRON_PLUGIN_RELATION_NAME")
                .unwrap_or_else(|_| "neutron-plugin".to_string()),
            scope: env::var("NEUTRON_PLUGIN_SCOPE").unwrap_or_else(|_| "global".to_string()),
            state_path: env::var("NEUTRON_PLUGIN_STATE_PATH")
                .map(PathBuf::from)
                .context("NEUTRON_PLUGIN_STATE_PATH is not set")?,
            rndc_key_path: env::var("NEUTRON_PLUGIN_RNDC_KEY_PATH").ok().map(PathBuf::from),
            address_key: env::var("NEUTRON_PLUGIN_ADDRESS_KEY").ok(),
            plugin_name: env::var("NEUTRON_PLUGIN_NAME").ok(),
            plugin_config: env::var("NEUTRON_PLUGIN_CONFIG").ok(),
            send_key_info: env::var("NEUTRON_PLUGIN_SEND_KEY_INFO")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            log_level: env::var("NEUTRON_PLUGIN_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration and build the provides configuration
    fn provides_config(&self) -> Result<ProvidesConfig> {
        if self.hook_name.is_empty() {
            anyhow::bail!("JUJU_HOOK_NAME cannot be empty");
        }

        let scope = Scope::parse(&self.scope).ok_or_else(|| {
            anyhow::anyhow!(
                "NEUTRON_PLUGIN_SCOPE '{}' is not valid. Valid scopes: global, service, unit",
                self.scope
            )
        })?;

        if self.plugin_name.is_some() != self.plugin_config.is_some() {
            anyhow::bail!("NEUTRON_PLUGIN_NAME and NEUTRON_PLUGIN_CONFIG must be set together");
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "NEUTRON_PLUGIN_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        let mut config = ProvidesConfig::new()
            .with_relation_name(&self.relation_name)
            .with_scope(scope);
        if let Some(ref path) = self.rndc_key_path {
            config = config.with_rndc_key_path(path);
        }
        if let Some(ref key) = self.address_key {
            config = config.with_address_key(key);
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse the plugin configuration object, if one was given
    fn plugin_settings(&self) -> Result<Option<(String, Map<String, Value>)>> {
        let (Some(name), Some(raw)) = (&self.plugin_name, &self.plugin_config) else {
            return Ok(None);
        };

        let value: Value =
            serde_json::from_str(raw).context("NEUTRON_PLUGIN_CONFIG is not valid JSON")?;
        let Value::Object(map) = value else {
            anyhow::bail!("NEUTRON_PLUGIN_CONFIG must be a JSON object");
        };

        Ok(Some((name.clone(), map)))
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return HookExitCode::ConfigError.into();
        }
    };

    let provides_config = match config.provides_config() {
        Ok(provides_config) => provides_config,
        Err(e) => {
            eprintln!("Configuration validation error: {:#}", e);
            return HookExitCode::ConfigError.into();
        }
    };

    let plugin = match config.plugin_settings() {
        Ok(plugin) => plugin,
        Err(e) => {
            eprintln!("Configuration validation error: {:#}", e);
            return HookExitCode::ConfigError.into();
        }
    };

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return HookExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return HookExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run_hook(&config, provides_config, plugin).await {
            Ok(()) => HookExitCode::Success,
            Err(e) => {
                error!("Hook {} failed: {:#}", config.hook_name, e);
                HookExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Execute one hook against the relation snapshot
async fn run_hook(
    config: &Config,
    provides_config: ProvidesConfig,
    plugin: Option<(String, Map<String, Value>)>,
) -> Result<()> {
    let mut registry = HookRegistry::new();
    NeutronPluginProvides::register_hooks(&mut registry)?;

    let handlers: Vec<ProvidesHook> = registry
        .resolve(&config.hook_name, &provides_config.endpoints)
        .into_iter()
        .filter(|r| r.relation_name.as_deref() == Some(provides_config.relation_name.as_str()))
        .map(|r| r.handler)
        .collect();

    if handlers.is_empty() {
        info!("Hook {} has no neutron-plugin handlers", config.hook_name);
        return Ok(());
    }

    let relation = match RelationSnapshot::load(&config.state_path).await? {
        Some(snapshot) => {
            if snapshot.relation_name != provides_config.relation_name {
                anyhow::bail!(
                    "Snapshot {} belongs to relation {}, not {}",
                    config.state_path.display(),
                    snapshot.relation_name,
                    provides_config.relation_name
                );
            }
            if snapshot.scope != provides_config.scope {
                anyhow::bail!(
                    "Snapshot {} uses scope {:?}, but NEUTRON_PLUGIN_SCOPE selects {:?}",
                    config.state_path.display(),
                    snapshot.scope,
                    provides_config.scope
                );
            }
            MemoryRelation::from_snapshot(snapshot)
        }
        None => MemoryRelation::new(&provides_config.relation_name, provides_config.scope),
    };
    let relation = Arc::new(relation);
    relation.set_remote_unit(config.remote_unit.clone()).await;

    // Broken covers both -departed and -broken; the unit leaves after the handler
    let departing = handlers.contains(&ProvidesHook::Broken);
    if let Some(ref unit) = config.remote_unit
        && !departing
    {
        relation.join(unit).await;
    }

    let provides = NeutronPluginProvides::new(relation.clone(), provides_config)?;
    for handler in handlers {
        debug!("Running {} for {}", handler.name(), config.hook_name);
        handler.invoke(&provides).await?;
    }

    if departing {
        if let Some(ref unit) = config.remote_unit {
            relation.depart(unit).await;
        }
        relation.set_remote_unit(None).await;
    }

    if let Some((name, settings)) = plugin
        && provides.is_connected().await?
    {
        provides.configure_plugin(&name, &settings).await?;
    }

    if config.send_key_info && !relation.memory_conversations().await.is_empty() {
        provides.send_key_info().await?;
    }

    relation
        .snapshot()
        .await
        .save(&config.state_path)
        .await
        .context("failed to save relation snapshot")?;

    info!("Hook {} handled", config.hook_name);
    Ok(())
}
