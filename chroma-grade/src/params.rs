//! Effect parameters, replaced wholesale on every scene sync.

use std::fmt;

use glam::IVec2;

/// The source-buffer kind this stage will grade. Anything else is skipped.
pub const SOURCE_COLOR: &str = "color";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionMode {
    /// Built-in sRGB transfer only.
    Passthrough,
    /// Configuration-driven display/view transform with a 3-D LUT.
    Managed,
}

/// Value type driving the stage; any field change marks the cached shader
/// stale.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeParams {
    /// Output size. Non-positive components fall back to the ambient
    /// viewport at execution time.
    pub framebuffer_size: IVec2,
    pub mode: CorrectionMode,
    /// Managed-mode settings; empty strings resolve to the active
    /// configuration's defaults.
    pub display: String,
    pub view: String,
    pub colorspace: String,
    pub looks: String,
    /// Requested LUT edge length; zero means the built-in default.
    pub lut3d_size: i32,
    /// Named source-buffer kind ("color" is the only graded kind).
    pub source_name: String,
    /// Path of the external source buffer, when one is bound.
    pub source_path: Option<String>,
}

impl Default for GradeParams {
    fn default() -> Self {
        Self {
            framebuffer_size: IVec2::ZERO,
            mode: CorrectionMode::Passthrough,
            display: String::new(),
            view: String::new(),
            colorspace: String::new(),
            looks: String::new(),
            lut3d_size: 0,
            source_name: SOURCE_COLOR.to_owned(),
            source_path: None,
        }
    }
}

impl fmt::Display for GradeParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GradeParams: {}x{} {:?} {} {} {} {} {} {} {}",
            self.framebuffer_size.x,
            self.framebuffer_size.y,
            self.mode,
            self.display,
            self.view,
            self.colorspace,
            self.looks,
            self.lut3d_size,
            self.source_name,
            self.source_path.as_deref().unwrap_or("-"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_field_change_breaks_equality() {
        let base = GradeParams::default();
        let mut changed = base.clone();
        assert_eq!(base, changed);

        changed.framebuffer_size = IVec2::new(800, 600);
        assert_ne!(base, changed);

        let mut changed = base.clone();
        changed.mode = CorrectionMode::Managed;
        assert_ne!(base, changed);

        let mut changed = base.clone();
        changed.looks = String::from("film");
        assert_ne!(base, changed);
    }
}
