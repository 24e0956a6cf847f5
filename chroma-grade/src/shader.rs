//! Shader sources and variant composition.
//!
//! Sources are looked up from a [`ShaderCatalog`] by logical identifier.
//! The fragment variant is assembled at build time: fixed version header,
//! an optional feature marker when the managed color path is on, the base
//! source, then the engine-provided transform text.

pub const GRADE_VERTEX: &str = "GradeVertex";
pub const GRADE_FRAGMENT: &str = "GradeFragment";

/// GLSL version header prepended to the composed fragment source.
pub const VERSION_HEADER: &str = "#version 120\n";

/// Feature marker enabling the LUT code path in the base fragment source.
pub const LUT_DEFINE: &str = "#define USE_COLOR_LUT\n";

/// Shader source text by logical identifier.
pub trait ShaderCatalog {
    fn source(&self, id: &str) -> Option<String>;
}

/// The packaged grade shaders. Kept deliberately old-school (GLSL 1.20):
/// this pass must run on the weakest contexts the host supports.
#[derive(Debug, Default)]
pub struct BuiltinShaders;

const GRADE_VERTEX_SRC: &str = r#"#version 120
attribute vec4 position;
attribute vec2 uvIn;
varying vec2 uvOut;

void main()
{
    gl_Position = position;
    uvOut = uvIn;
}
"#;

const GRADE_FRAGMENT_SRC: &str = r#"uniform sampler2D colorIn;
varying vec2 uvOut;

#if defined(USE_COLOR_LUT)
uniform sampler3D lutIn;
vec4 transformColor(vec4 inColor, sampler3D lut);
#else
float linearToSrgb(float v)
{
    return v <= 0.0031308 ? 12.92 * v : 1.055 * pow(v, 1.0 / 2.4) - 0.055;
}
#endif

void main()
{
    vec4 color = texture2D(colorIn, uvOut);
#if defined(USE_COLOR_LUT)
    color = transformColor(color, lutIn);
#else
    color.rgb = vec3(linearToSrgb(color.r),
                     linearToSrgb(color.g),
                     linearToSrgb(color.b));
#endif
    gl_FragColor = color;
}
"#;

impl ShaderCatalog for BuiltinShaders {
    fn source(&self, id: &str) -> Option<String> {
        match id {
            GRADE_VERTEX => Some(GRADE_VERTEX_SRC.to_owned()),
            GRADE_FRAGMENT => Some(GRADE_FRAGMENT_SRC.to_owned()),
            _ => None,
        }
    }
}

/// Assemble the fragment source for the requested variant.
pub fn compose_fragment(base: &str, lut_enabled: bool, engine_source: &str) -> String {
    let mut source = String::from(VERSION_HEADER);
    if lut_enabled {
        source.push_str(LUT_DEFINE);
    }
    source.push_str(base);
    if lut_enabled {
        source.push_str(engine_source);
    }
    source
}
