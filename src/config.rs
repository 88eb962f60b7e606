use std::fmt;
use std::str::FromStr;

use crate::error::RenderError;

/// Which pipeline draws into the canvas.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum RenderMode {
    /// Fullscreen quad shaded with animated fBm clouds.
    #[default]
    WebGl,
    /// Static placeholder: sky background and a single circle.
    Canvas2d,
}

impl FromStr for RenderMode {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "webgl" | "webgl2" | "gl" => Ok(Self::WebGl),
            "2d" | "canvas" | "canvas2d" => Ok(Self::Canvas2d),
            other => Err(RenderError::config(format!("unknown renderer `{other}`"))),
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WebGl => f.write_str("webgl"),
            Self::Canvas2d => f.write_str("2d"),
        }
    }
}

/// Linear RGBA colour with components in `0.0..=1.0`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::new(
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
            1.0,
        )
    }

    /// CSS `skyblue` (#87CEEB).
    pub fn sky_blue() -> Self {
        Self::from_rgb8(0x87, 0xce, 0xeb)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// DOM id of the target canvas.
    pub canvas_id: String,
    pub mode: RenderMode,
    /// Colour the surface is cleared to right after acquisition.
    pub background: Rgba,
    pub log_level: log::Level,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            canvas_id: "c".to_string(),
            mode: RenderMode::default(),
            background: Rgba::sky_blue(),
            log_level: log::Level::Info,
        }
    }
}

impl RenderConfig {
    /// Applies optional overrides as read from the host (e.g. `data-*`
    /// attributes on the canvas). Absent values keep their defaults.
    pub fn with_overrides(
        mut self,
        mode: Option<&str>,
        log_level: Option<&str>,
    ) -> Result<Self, RenderError> {
        if let Some(mode) = mode {
            self.mode = mode.parse()?;
        }
        if let Some(level) = log_level {
            self.log_level = level
                .trim()
                .parse()
                .map_err(|_| RenderError::config(format!("unknown log level `{level}`")))?;
        }
        Ok(self)
    }
}
