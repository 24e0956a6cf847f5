//! Full-screen color-grade post-process stage.
//!
//! [`stage::ColorGradeStage`] snapshots the current color output, runs it
//! through either a built-in sRGB transfer or a configuration-driven
//! display transform (shader text + 3-D LUT supplied by an external
//! [`engine::ColorTransformEngine`]), and writes the graded pixels back —
//! restoring every piece of ambient device state it touched.
//!
//! The stage holds its GPU resources across frames and rebuilds them only
//! when their defining parameters change; see [`params::GradeParams`].

pub mod engine;
pub mod params;
pub mod shader;
pub mod stage;

pub use engine::{
    COLOR_CONFIG_ENV, ColorTransformEngine, DEFAULT_LUT_EDGE, DisabledEngine, LUT_EDGE_ENV,
    TransformError, TransformProgram, TransformRequest, color_config_active, resolve_lut_edge,
};
pub use params::{CorrectionMode, GradeParams, SOURCE_COLOR};
pub use shader::{BuiltinShaders, GRADE_FRAGMENT, GRADE_VERTEX, ShaderCatalog, compose_fragment};
pub use stage::ColorGradeStage;
