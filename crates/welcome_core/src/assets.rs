//! Welcome page bootstrap: wizard mode from the page query plus the fixed
//! image set the wizard renders.

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use shared::domain::{DrinkCharacter, SipLevel, WelcomeMode};
use tracing::info;
use url::form_urlencoded;

const APP_ICON: &str = "icons/glass-512.png";
const HERO_IMAGE: &str = "images/welcome/hero.png";
const REMINDER_FULLSCREEN: &str = "images/reminders/fullscreen.png";
const REMINDER_COMPACT: &str = "images/reminders/compact.png";

fn character_image(character: DrinkCharacter) -> &'static str {
    match character {
        DrinkCharacter::YoungWoman => "images/characters/young_woman.png",
        DrinkCharacter::YoungMan => "images/characters/young_man.png",
        DrinkCharacter::Diverse => "images/characters/diverse.png",
    }
}

fn sip_level_image(level: SipLevel) -> &'static str {
    match level {
        SipLevel::Minimal => "images/sips/minimal.png",
        SipLevel::Small => "images/sips/small.png",
        SipLevel::Medium => "images/sips/medium.png",
        SipLevel::Large => "images/sips/large.png",
        SipLevel::Full => "images/sips/full.png",
    }
}

/// Extracts the `mode` parameter from a page query string. Absent or
/// unrecognized values fall back to the full wizard on purpose: a stale
/// deep link should open the wizard, not a blank page.
pub fn mode_from_query(location_query: &str) -> WelcomeMode {
    let mode = form_urlencoded::parse(location_query.trim_start_matches('?').as_bytes())
        .find(|(key, _)| key == "mode")
        .map(|(_, value)| value.into_owned());
    WelcomeMode::from_query_value(mode.as_deref())
}

#[async_trait]
pub trait AssetResolver: Send + Sync {
    async fn resolve(&self, relative_path: &str) -> Result<String>;
}

pub struct FsAssetResolver {
    root: PathBuf,
}

impl FsAssetResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl AssetResolver for FsAssetResolver {
    async fn resolve(&self, relative_path: &str) -> Result<String> {
        let full = self.root.join(relative_path);
        tokio::fs::metadata(&full)
            .await
            .with_context(|| format!("missing asset file: {}", full.display()))?;
        Ok(full.display().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WelcomeAssets {
    pub app_icon: String,
    pub hero: String,
    pub character_young_woman: String,
    pub character_young_man: String,
    pub character_diverse: String,
    pub sip_minimal: String,
    pub sip_small: String,
    pub sip_medium: String,
    pub sip_large: String,
    pub sip_full: String,
    pub reminder_fullscreen: String,
    pub reminder_compact: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WelcomePage {
    pub mode: WelcomeMode,
    pub assets: WelcomeAssets,
}

pub struct WelcomeAssetLoader {
    resolver: Arc<dyn AssetResolver>,
}

impl WelcomeAssetLoader {
    pub fn new(resolver: Arc<dyn AssetResolver>) -> Self {
        Self { resolver }
    }

    /// Resolves every welcome image concurrently; one missing asset fails
    /// the whole page load.
    pub async fn load(&self, location_query: &str) -> Result<WelcomePage> {
        let mode = mode_from_query(location_query);
        info!(
            "assets: loading welcome page mode={}",
            mode.as_query_value()
        );

        let (
            app_icon,
            hero,
            character_young_woman,
            character_young_man,
            character_diverse,
            sip_minimal,
            sip_small,
            sip_medium,
            sip_large,
            sip_full,
            reminder_fullscreen,
            reminder_compact,
        ) = tokio::try_join!(
            self.resolve(APP_ICON),
            self.resolve(HERO_IMAGE),
            self.resolve(character_image(DrinkCharacter::YoungWoman)),
            self.resolve(character_image(DrinkCharacter::YoungMan)),
            self.resolve(character_image(DrinkCharacter::Diverse)),
            self.resolve(sip_level_image(SipLevel::Minimal)),
            self.resolve(sip_level_image(SipLevel::Small)),
            self.resolve(sip_level_image(SipLevel::Medium)),
            self.resolve(sip_level_image(SipLevel::Large)),
            self.resolve(sip_level_image(SipLevel::Full)),
            self.resolve(REMINDER_FULLSCREEN),
            self.resolve(REMINDER_COMPACT),
        )?;

        Ok(WelcomePage {
            mode,
            assets: WelcomeAssets {
                app_icon,
                hero,
                character_young_woman,
                character_young_man,
                character_diverse,
                sip_minimal,
                sip_small,
                sip_medium,
                sip_large,
                sip_full,
                reminder_fullscreen,
                reminder_compact,
            },
        })
    }

    async fn resolve(&self, relative_path: &str) -> Result<String> {
        self.resolver
            .resolve(relative_path)
            .await
            .with_context(|| format!("failed to resolve welcome asset '{relative_path}'"))
    }
}

#[cfg(test)]
#[path = "tests/assets_tests.rs"]
mod tests;
