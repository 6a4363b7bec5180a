//! Persisted light/dark theme preference.

use learnpath_core::Theme;
use learnpath_storage::Storage;
use tracing::{debug, warn};

use crate::store::Result;

/// Storage slot of the theme preference.
pub const THEME_KEY: &str = "theme";

/// Loads, toggles and saves the theme preference.
pub struct ThemeManager<S: Storage> {
    storage: S,
    theme: Theme,
}

impl<S: Storage> ThemeManager<S> {
    /// Open the manager, reading the saved preference.
    pub async fn open(storage: S) -> Result<Self> {
        let mut manager = Self {
            storage,
            theme: Theme::default(),
        };
        manager.load().await?;
        Ok(manager)
    }

    /// Re-read the preference. Missing or unknown values mean the default.
    pub async fn load(&mut self) -> Result<Theme> {
        self.theme = match self.storage.load_slot(THEME_KEY).await? {
            None => Theme::default(),
            Some(raw) => parse_stored(&raw).unwrap_or_else(|| {
                warn!("Ignoring stored theme {:?}", raw);
                Theme::default()
            }),
        };
        debug!("Theme is {}", self.theme);
        Ok(self.theme)
    }

    /// Active theme.
    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Icon of the toggle control.
    pub fn icon(&self) -> &'static str {
        self.theme.icon()
    }

    /// Switch to the other theme and save it.
    pub async fn toggle(&mut self) -> Result<Theme> {
        self.set(self.theme.toggled()).await
    }

    /// Apply and save a theme.
    pub async fn set(&mut self, theme: Theme) -> Result<Theme> {
        let json = serde_json::to_string(&theme)?;
        self.storage.save_slot(THEME_KEY, &json).await?;
        self.theme = theme;
        debug!("Theme set to {}", theme);
        Ok(theme)
    }
}

/// Accepts the JSON form (`"dark"`) and the bare word (`dark`).
fn parse_stored(raw: &str) -> Option<Theme> {
    serde_json::from_str::<Theme>(raw)
        .ok()
        .or_else(|| raw.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use learnpath_storage::{JsonStorage, MemoryStorage};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_default_is_light() {
        let manager = ThemeManager::open(MemoryStorage::new()).await.unwrap();
        assert_eq!(manager.theme(), Theme::Light);
        assert_eq!(manager.icon(), "🌙");
    }

    #[tokio::test]
    async fn test_toggle_persists() {
        let storage = MemoryStorage::new();
        let mut manager = ThemeManager::open(storage.clone()).await.unwrap();

        assert_eq!(manager.toggle().await.unwrap(), Theme::Dark);
        assert_eq!(manager.icon(), "☀️");
        assert_eq!(
            storage.load_slot(THEME_KEY).await.unwrap().as_deref(),
            Some("\"dark\"")
        );

        let reopened = ThemeManager::open(storage).await.unwrap();
        assert_eq!(reopened.theme(), Theme::Dark);
    }

    #[tokio::test]
    async fn test_bare_and_invalid_values() {
        let manager = ThemeManager::open(MemoryStorage::with_slot(THEME_KEY, "dark"))
            .await
            .unwrap();
        assert_eq!(manager.theme(), Theme::Dark);

        let manager = ThemeManager::open(MemoryStorage::with_slot(THEME_KEY, "\"sepia\""))
            .await
            .unwrap();
        assert_eq!(manager.theme(), Theme::Light);
    }

    #[tokio::test]
    async fn test_survives_restart_on_disk() {
        let dir = TempDir::new().unwrap();
        let storage = JsonStorage::new(dir.path()).await.unwrap();
        let mut manager = ThemeManager::open(storage).await.unwrap();
        manager.toggle().await.unwrap();
        drop(manager);

        let storage = JsonStorage::new(dir.path()).await.unwrap();
        let manager = ThemeManager::open(storage).await.unwrap();
        assert_eq!(manager.theme(), Theme::Dark);
    }
}
