//! Interface to the external color-management engine.
//!
//! The engine itself is a black box: given display/view/colorspace/look
//! names it returns shader source implementing the transform plus a 3-D
//! LUT sample grid. This module owns the request/response values, the
//! environment gate, and the LUT edge-length resolution.

/// Default LUT edge length; 65 samples resample well in common engines.
pub const DEFAULT_LUT_EDGE: i32 = 65;

/// Non-empty value marks a color-management configuration as active.
pub const COLOR_CONFIG_ENV: &str = "CHROMA_COLOR_CONFIG";

/// Positive integer overriding the configured/default LUT edge length.
pub const LUT_EDGE_ENV: &str = "CHROMA_LUT3D_EDGE_SIZE";

/// Whether an active color configuration is present. Absent configuration
/// forces passthrough even when parameters request managed correction.
pub fn color_config_active() -> bool {
    std::env::var(COLOR_CONFIG_ENV).is_ok_and(|value| !value.is_empty())
}

/// Effective LUT edge length for a configured value: the configured length
/// when positive, else the default, with the environment override winning
/// when it parses to a positive integer.
pub fn resolve_lut_edge(configured: i32) -> i32 {
    let env_override = std::env::var(LUT_EDGE_ENV)
        .ok()
        .and_then(|value| value.parse::<i32>().ok());
    resolve_lut_edge_with(configured, env_override)
}

fn resolve_lut_edge_with(configured: i32, env_override: Option<i32>) -> i32 {
    let mut edge = if configured > 0 {
        configured
    } else {
        DEFAULT_LUT_EDGE
    };
    if let Some(value) = env_override {
        if value > 0 {
            edge = value;
        }
    }
    edge
}

/// Transform lookup request. Empty name fields are resolved to the active
/// configuration's defaults by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformRequest {
    pub display: String,
    pub view: String,
    pub colorspace: String,
    pub looks: String,
    pub lut_edge: i32,
}

/// Engine response: shader text defining `transformColor` plus a flattened
/// RGB LUT of `3 · edge³` floats.
#[derive(Debug, Clone)]
pub struct TransformProgram {
    pub shader_text: String,
    pub lut: Vec<f32>,
    pub lut_edge: i32,
}

impl TransformProgram {
    /// Whether the LUT length matches the advertised edge length.
    pub fn lut_is_consistent(&self) -> bool {
        let edge = self.lut_edge as usize;
        self.lut.len() == 3 * edge * edge * edge
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("no active color configuration")]
    NoConfiguration,
    #[error("color transform generation failed: {0}")]
    Engine(String),
}

pub trait ColorTransformEngine {
    /// Whether the managed path may be used at all.
    fn is_active(&self) -> bool {
        color_config_active()
    }

    fn gpu_transform(&self, request: &TransformRequest) -> Result<TransformProgram, TransformError>;
}

/// Engine used when no color-management backend is wired in: never active,
/// every transform request fails.
#[derive(Debug, Default)]
pub struct DisabledEngine;

impl ColorTransformEngine for DisabledEngine {
    fn is_active(&self) -> bool {
        false
    }

    fn gpu_transform(&self, _request: &TransformRequest) -> Result<TransformProgram, TransformError> {
        Err(TransformError::NoConfiguration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lut_edge_defaults_to_sixty_five() {
        assert_eq!(resolve_lut_edge_with(0, None), DEFAULT_LUT_EDGE);
        assert_eq!(resolve_lut_edge_with(-3, None), DEFAULT_LUT_EDGE);
    }

    #[test]
    fn configured_edge_wins_over_default() {
        assert_eq!(resolve_lut_edge_with(33, None), 33);
    }

    #[test]
    fn positive_env_override_wins_over_everything() {
        assert_eq!(resolve_lut_edge_with(33, Some(17)), 17);
        assert_eq!(resolve_lut_edge_with(0, Some(17)), 17);
        assert_eq!(resolve_lut_edge_with(33, Some(0)), 33);
        assert_eq!(resolve_lut_edge_with(33, Some(-5)), 33);
    }

    #[test]
    fn lut_consistency_checks_sample_count() {
        let good = TransformProgram {
            shader_text: String::new(),
            lut: vec![0.0; 3 * 8],
            lut_edge: 2,
        };
        assert!(good.lut_is_consistent());

        let bad = TransformProgram {
            shader_text: String::new(),
            lut: vec![0.0; 10],
            lut_edge: 2,
        };
        assert!(!bad.lut_is_consistent());
    }
}
