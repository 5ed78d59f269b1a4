//! The two-valued theme preference, kept in the local store next to the task
//! snapshot regardless of session mode.

use sqlx::SqlitePool;

use crate::db::{kv_get, kv_set};
use crate::error::Result;

pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Dark unless the stored value says `light` exactly. Anything else,
    /// missing value included, is the dark default.
    pub fn from_stored(value: Option<&str>) -> Self {
        match value {
            Some("light") => Theme::Light,
            _ => Theme::Dark,
        }
    }
}

pub async fn load_theme(pool: &SqlitePool) -> Result<Theme> {
    let stored = kv_get(pool, THEME_KEY).await?;
    Ok(Theme::from_stored(stored.as_deref()))
}

pub async fn save_theme(pool: &SqlitePool, theme: Theme) -> Result<()> {
    kv_set(pool, THEME_KEY, theme.as_str()).await
}
