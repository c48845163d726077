//! Level themes and theme lookup

use crate::{RawId, Result};
use serde::{Deserialize, Serialize};

/// Display name used when no theme could be resolved
pub const DEFAULT_THEME_NAME: &str = "Adventure";

/// A named, contiguous range of levels sharing a background
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub id: u32,
    pub name: String,
    pub start_level: u32,
    pub end_level: u32,
    pub background_image: String,
}

impl Theme {
    /// Inclusive range check
    pub fn contains(&self, level: u32) -> bool {
        self.start_level <= level && level <= self.end_level
    }
}

/// Resolve the theme for a level.
///
/// Returns the first theme whose range contains `level`; if none does, the
/// first theme of the list. `None` only for an empty list.
pub fn theme_for_level(level: u32, themes: &[Theme]) -> Option<&Theme> {
    themes
        .iter()
        .find(|theme| theme.contains(level))
        .or_else(|| themes.first())
}

/// Row from the `themes` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeRow {
    pub id: RawId,
    pub name: String,
    pub start_level: i64,
    pub end_level: i64,
    #[serde(default)]
    pub background_image: Option<String>,
}

impl ThemeRow {
    /// Convert to Theme. The id must be numeric (number or decimal string).
    pub fn into_theme(self) -> Result<Theme> {
        let id = self.id.to_u32()?;
        Ok(Theme {
            id,
            name: self.name,
            start_level: clamp_level(self.start_level),
            end_level: clamp_level(self.end_level),
            background_image: self.background_image.unwrap_or_default(),
        })
    }
}

fn clamp_level(level: i64) -> u32 {
    u32::try_from(level.max(0)).unwrap_or(u32::MAX)
}
