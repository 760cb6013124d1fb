use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{DrillError, Result};
use crate::storage::{StoragePlugin, ToggleResponse};
use crate::{Connection, DrillTransport, ENDPOINTS};

impl<T: DrillTransport> Connection<T> {
    /// All storage plugins with their full configuration.
    pub async fn storage_plugins(&self) -> Result<Vec<StoragePlugin>> {
        let res = self
            .transport
            .get(self.endpoint(&[ENDPOINTS.storage])?)
            .await?;
        let plugins: Vec<StoragePlugin> = serde_json::from_value(res)?;
        Ok(plugins)
    }

    /// Configuration of a single storage plugin.
    pub async fn storage_plugin_info(&self, plugin: &str) -> Result<Value> {
        let plugin = non_empty_plugin(plugin)?;
        let file = format!("{plugin}.json");
        let url = self.endpoint(&[ENDPOINTS.storage_dir, file.as_str()])?;
        self.transport.get(url).await
    }

    /// Names of every storage plugin.
    ///
    /// Refreshes both plugin caches.
    pub async fn all_storage_plugin_names(&self) -> Result<Vec<String>> {
        let plugins = self.storage_plugins().await?;

        let all: Vec<String> = plugins.iter().map(|p| p.name.clone()).collect();
        let enabled: Vec<String> = plugins
            .iter()
            .filter(|p| p.is_enabled())
            .map(|p| p.name.clone())
            .collect();

        let mut state = self.state.lock();
        state.cached_plugins = Some(all.clone());
        state.cached_enabled_plugins = Some(enabled);

        Ok(all)
    }

    /// Names of enabled storage plugins, empty if drill isn't reachable.
    ///
    /// Refreshes the enabled plugin cache.
    pub async fn enabled_storage_plugin_names(&self) -> Result<Vec<String>> {
        if !self.is_active().await {
            return Ok(Vec::new());
        }

        let enabled: Vec<String> = self
            .storage_plugins()
            .await?
            .into_iter()
            .filter(StoragePlugin::is_enabled)
            .map(|p| p.name)
            .collect();

        self.state.lock().cached_enabled_plugins = Some(enabled.clone());
        Ok(enabled)
    }

    /// Names of disabled storage plugins.
    pub async fn disabled_storage_plugin_names(&self) -> Result<Vec<String>> {
        let disabled = self
            .storage_plugins()
            .await?
            .into_iter()
            .filter(|p| !p.is_enabled())
            .map(|p| p.name)
            .collect();
        Ok(disabled)
    }

    /// Plugin names from the cache, fetching them on first use.
    pub async fn cached_plugin_names(&self) -> Result<Vec<String>> {
        if let Some(cached) = self.state.lock().cached_plugins.clone() {
            return Ok(cached);
        }
        self.all_storage_plugin_names().await
    }

    /// Enabled plugin names from the cache, fetching them on first use.
    pub async fn cached_enabled_plugin_names(&self) -> Result<Vec<String>> {
        if let Some(cached) = self.state.lock().cached_enabled_plugins.clone() {
            return Ok(cached);
        }
        self.enabled_storage_plugin_names().await
    }

    pub fn clear_plugin_cache(&self) {
        let mut state = self.state.lock();
        state.cached_plugins = None;
        state.cached_enabled_plugins = None;
    }

    /// Enable a storage plugin. Returns whether drill reported success.
    pub async fn enable_plugin(&self, plugin: &str) -> Result<bool> {
        self.toggle_plugin(plugin, true).await
    }

    /// Disable a storage plugin. Returns whether drill reported success.
    pub async fn disable_plugin(&self, plugin: &str) -> Result<bool> {
        self.toggle_plugin(plugin, false).await
    }

    async fn toggle_plugin(&self, plugin: &str, enable: bool) -> Result<bool> {
        let plugin = non_empty_plugin(plugin)?;
        let flag = if enable { "true" } else { "false" };
        let url = self.endpoint(&[ENDPOINTS.storage_dir, plugin, "enable", flag])?;

        let res: ToggleResponse = serde_json::from_value(self.transport.get(url).await?)?;
        if !res.is_success() {
            warn!(%plugin, enable, result = ?res.result, "failed to toggle storage plugin");
            return Ok(false);
        }

        debug!(%plugin, enable, "toggled storage plugin");
        self.clear_plugin_cache();
        Ok(true)
    }
}

fn non_empty_plugin(plugin: &str) -> Result<&str> {
    let plugin = plugin.trim();
    if plugin.is_empty() {
        return Err(DrillError::InvalidArgument(
            "plugin name cannot be empty".to_string(),
        ));
    }
    Ok(plugin)
}
