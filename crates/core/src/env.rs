//! Environment overlays applied on top of the inherited process environment.
//!
//! [`EnvOverlay`] is the generic "last writer wins" mapping the launcher
//! applies to every child. [`AppEnv`] enumerates the keys the Pixlet tap
//! understands and renders them into an overlay for a single app run.

use std::collections::BTreeMap;

/// Forced on every child so CLI output is captured without ANSI escapes.
pub const NO_COLOR: &str = "NO_COLOR";

/// Input payload handed to the app (request body).
pub const TAP_PIXLET_APP_INPUT: &str = "TAP_PIXLET_APP_INPUT";

/// Installation the rendered app is pushed to.
pub const TAP_PIXLET_INSTALLATION_ID: &str = "TAP_PIXLET_INSTALLATION_ID";

/// Whether the rendered app is pushed in the background.
pub const TAP_PIXLET_BACKGROUND: &str = "TAP_PIXLET_BACKGROUND";

/// Installation id used for notification pushes.
pub const NOTIFICATION_INSTALLATION_ID: &str = "notification";

/// Ordered set of environment variables applied after the inherited
/// environment. Setting a key twice keeps the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverlay {
    vars: BTreeMap<String, String>,
}

impl EnvOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, replacing any earlier value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Builder-style variant of [`set`](Self::set).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Per-run settings understood by the Pixlet tap.
///
/// `None` fields are left to whatever the inherited environment (or the
/// Meltano project) provides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppEnv {
    /// Value for `TAP_PIXLET_INSTALLATION_ID`.
    pub installation_id: Option<String>,
    /// Value for `TAP_PIXLET_BACKGROUND`.
    pub background: Option<bool>,
}

impl AppEnv {
    /// Settings forced by the notify endpoint: push to the `notification`
    /// installation in the foreground.
    pub fn notification() -> Self {
        Self {
            installation_id: Some(NOTIFICATION_INSTALLATION_ID.to_string()),
            background: Some(false),
        }
    }

    /// Render these settings plus the input payload into an overlay.
    ///
    /// The input is always written last so it cannot be shadowed.
    pub fn to_overlay(&self, input: &str) -> EnvOverlay {
        let mut overlay = EnvOverlay::new();
        if let Some(id) = &self.installation_id {
            overlay.set(TAP_PIXLET_INSTALLATION_ID, id.as_str());
        }
        if let Some(background) = self.background {
            overlay.set(TAP_PIXLET_BACKGROUND, background.to_string());
        }
        overlay.with(TAP_PIXLET_APP_INPUT, input)
    }
}
