//! All-or-nothing settings groups: five concurrent reads, three concurrent writes.

use futures_util::future::{try_join3, try_join5};
use futures_util::TryFutureExt;
use panel_core::{PanelError, SettingsSnapshot, SettingsWrite};
use panel_logging::{panel_info, panel_warn};

use crate::client::PanelApi;

/// Reads every settings resource concurrently. Any failure fails the whole
/// group and nothing is returned.
pub async fn load_settings(api: &dyn PanelApi) -> Result<SettingsSnapshot, PanelError> {
    let result = try_join5(
        api.global_settings()
            .map_err(PanelError::group("global settings")),
        api.user_preferences()
            .map_err(PanelError::group("user preferences")),
        api.categories().map_err(PanelError::group("categories")),
        api.available_models()
            .map_err(PanelError::group("available models")),
        api.quality_lists().map_err(PanelError::group("quality lists")),
    )
    .await;

    match result {
        Ok((global, preferences, taxonomy, available_models, quality)) => {
            panel_info!(
                "settings loaded: {} tunables, {} preferences, {} tasks, {} models",
                global.0.len(),
                preferences.len(),
                taxonomy.task_count(),
                available_models.len()
            );
            Ok(SettingsSnapshot {
                global,
                preferences: preferences.into_iter().collect(),
                taxonomy,
                available_models,
                quality,
            })
        }
        Err(err) => {
            panel_warn!("settings load failed: {}", err);
            Err(err)
        }
    }
}

/// Writes the three settings payloads concurrently; succeeds only if all do.
pub async fn save_settings(api: &dyn PanelApi, write: &SettingsWrite) -> Result<(), PanelError> {
    let result = try_join3(
        api.save_global_settings(&write.global)
            .map_err(PanelError::group("global settings")),
        api.save_user_preferences(&write.preferences)
            .map_err(PanelError::group("user preferences")),
        api.save_quality_lists(&write.quality)
            .map_err(PanelError::group("quality lists")),
    )
    .await;

    match result {
        Ok(_) => {
            panel_info!("settings saved");
            Ok(())
        }
        Err(err) => {
            panel_warn!("settings save failed: {}", err);
            Err(err)
        }
    }
}
