//! Persisted client settings.
//!
//! Each setting is one string entry in the injected key-value store, so a
//! settings file written by hand or by another front end stays readable.

use tracing::warn;

use companion_connection::ConnectionIdentity;
use companion_store::KeyValueStore;
use companion_visual::{RenderStyle, Size, VisualState};

pub const KEY_HOST_URL: &str = "host_url";
pub const KEY_SESSION_ID: &str = "session_id";
pub const KEY_RENDER_STYLE: &str = "render_style";
pub const KEY_SIZE: &str = "size";
pub const KEY_CHARACTER: &str = "character";
pub const KEY_VISIBLE: &str = "visible";

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanionConfig {
    /// Backend base URL (`http`, `https`, `ws` or `wss`).
    pub host_url: String,

    /// Chat session to join.
    pub session_id: String,

    pub render_style: RenderStyle,

    pub size: Size,

    /// Selected character, if any.
    pub character: Option<String>,

    /// Whether the character is shown.
    pub visible: bool,
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            host_url: "http://localhost:8000".into(),
            session_id: "default".into(),
            render_style: RenderStyle::default(),
            size: Size::default(),
            character: None,
            visible: true,
        }
    }
}

impl CompanionConfig {
    /// Reads every setting from `store`, keeping the default for missing or
    /// unparsable values.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let mut config = Self::default();

        if let Some(host) = store.get(KEY_HOST_URL).filter(|v| !v.trim().is_empty()) {
            config.host_url = host;
        }
        if let Some(session) = store.get(KEY_SESSION_ID).filter(|v| !v.trim().is_empty()) {
            config.session_id = session;
        }
        if let Some(style) = parse_setting(store, KEY_RENDER_STYLE) {
            config.render_style = style;
        }
        if let Some(size) = parse_setting(store, KEY_SIZE) {
            config.size = size;
        }
        config.character = store.get(KEY_CHARACTER).filter(|v| !v.is_empty());
        if let Some(visible) = parse_setting(store, KEY_VISIBLE) {
            config.visible = visible;
        }

        config
    }

    /// Writes every setting to `store`.
    pub fn save(&self, store: &dyn KeyValueStore) -> anyhow::Result<()> {
        store.set(KEY_HOST_URL, &self.host_url)?;
        store.set(KEY_SESSION_ID, &self.session_id)?;
        store.set(KEY_RENDER_STYLE, self.render_style.as_str())?;
        store.set(KEY_SIZE, self.size.as_str())?;
        match &self.character {
            Some(character) => store.set(KEY_CHARACTER, character)?,
            None => store.remove(KEY_CHARACTER)?,
        }
        store.set(KEY_VISIBLE, if self.visible { "true" } else { "false" })?;
        Ok(())
    }

    pub fn identity(&self) -> ConnectionIdentity {
        ConnectionIdentity::new(&self.host_url, &self.session_id)
    }

    /// Render settings as an initial visual snapshot.
    pub fn visual_state(&self) -> VisualState {
        VisualState {
            render_style: self.render_style,
            size: self.size,
            character: self.character.clone(),
            visible: self.visible,
            ..VisualState::default()
        }
    }

    /// Copies the render settings back from a visual snapshot.
    pub fn update_from_visual(&mut self, visual: &VisualState) {
        self.render_style = visual.render_style;
        self.size = visual.size;
        self.character = visual.character.clone();
        self.visible = visual.visible;
    }
}

fn parse_setting<T: std::str::FromStr>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "unparsable setting, using default");
            None
        }
    }
}
