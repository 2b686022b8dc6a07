//! Turning intercepted calls into readable `CallRecord`s.

use gleam::gl;
use serde::Serialize;

use crate::call::{Arg, Call};
use crate::context::{GlContext, Parameter};
use crate::{identity, shader_name};

/// Names of the draw modes a draw call's description may mention, in the
/// order they are listed when more than one matches.
const DRAW_MODES: [&str; 6] = ["POINTS", "LINES", "LINE_LOOP", "LINE_STRIP", "TRIANGLES", "TRIANGLE_FAN"];

/// The bits `clear` may be passed, in the order its description lists them.
const CLEAR_BITS: [(gl::GLbitfield, &str); 3] = [
    (gl::DEPTH_BUFFER_BIT, "DEPTH"),
    (gl::STENCIL_BUFFER_BIT, "STENCIL"),
    (gl::COLOR_BUFFER_BIT, "COLOR"),
];

/// Methods whose records never name a program.
const NO_PROGRAM: [&str; 2] = ["clear", "bindFramebuffer"];

const UNNAMED_SHADER: &str = "Unnamed shader";

/// A rough classification of a call, by method name.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallType {
    Draw,
    Clear,
    Bind,
    Unclassified,
}

impl CallType {
    fn is_unclassified(&self) -> bool {
        *self == CallType::Unclassified
    }

    pub fn classify(method_name: &str) -> CallType {
        let lower = method_name.to_lowercase();
        if lower.contains("draw") {
            CallType::Draw
        } else if lower.contains("bind") {
            CallType::Bind
        } else if method_name == "clear" {
            CallType::Clear
        } else {
            CallType::Unclassified
        }
    }
}

/// A description of one recorded call.
///
/// This serializes as `{ "draw": ..., "program": ..., "type": ... }`, leaving
/// out `program` when there isn't one, and `type` when the call is
/// unclassified.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CallRecord {
    #[serde(rename = "draw")]
    description: String,

    #[serde(rename = "program", skip_serializing_if = "Option::is_none")]
    program_name: Option<String>,

    #[serde(rename = "type", skip_serializing_if = "CallType::is_unclassified")]
    call_type: CallType,
}

impl CallRecord {
    /// The method name, followed by details for draws, clears, and
    /// framebuffer binds. For example:
    ///
    /// - `drawArrays: TRIANGLES, 0 indices, 36 vertices`
    /// - `clear: DEPTH, COLOR`
    /// - `bindFramebuffer ID - 3`
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The name of the program that was current when the call was made.
    ///
    /// This is `None` if no program was current, and for `clear` and
    /// `bindFramebuffer`, which don't use one. If the program's first shader
    /// doesn't name itself, this is `"Unnamed shader"`.
    pub fn program_name(&self) -> Option<&str> {
        self.program_name.as_deref()
    }

    pub fn call_type(&self) -> CallType {
        self.call_type
    }
}

/// Describe `call`, made on `gl`.
///
/// This runs after the call has been passed along to the context, so queries
/// like the current program reflect its effects.
pub fn decode(gl: &dyn GlContext, call: &Call) -> CallRecord {
    let name = call.method().name();
    let lower = name.to_lowercase();
    let mut description = name.to_string();

    if lower.contains("draw") {
        description = format!("{}: {}, {} indices", description, draw_modes(gl, call), display_arg(call, 1));
        if lower.contains("array") {
            description = format!("{}, {} vertices", description, display_arg(call, 2));
        }
    }

    if let Call::bind_framebuffer { framebuffer: Some(framebuffer), .. } = *call {
        let id = identity::global().lookup(framebuffer);
        description = match id {
            Some(id) => format!("{} ID - {}", description, id),
            None => format!("{} ID - undefined", description),
        };
    }

    if let Call::clear { mask } = *call {
        let bits: Vec<&str> = CLEAR_BITS
            .iter()
            .filter(|&&(bit, _)| mask & bit != 0)
            .map(|&(_, bit_name)| bit_name)
            .collect();
        description = format!("{}: {}", description, bits.join(", "));
    }

    let program_name = if NO_PROGRAM.contains(&name) {
        None
    } else {
        current_program_name(gl)
    };

    CallRecord {
        description,
        program_name,
        call_type: CallType::classify(name),
    }
}

/// Return the names of all the draw modes whose values in `gl` match the
/// call's first argument, joined with commas.
///
/// Ordinarily exactly one matches, but a context with unusual constants may
/// produce none, or several.
fn draw_modes(gl: &dyn GlContext, call: &Call) -> String {
    let mode = match call.arg(0) {
        Some(Arg::Int(mode)) => mode,
        _ => return String::new(),
    };

    DRAW_MODES
        .iter()
        .filter(|name| gl.constant(name).map(i64::from) == Some(mode))
        .copied()
        .collect::<Vec<&str>>()
        .join(",")
}

fn display_arg(call: &Call, index: usize) -> String {
    match call.arg(index) {
        Some(arg) => arg.to_string(),
        None => "undefined".to_string(),
    }
}

fn current_program_name(gl: &dyn GlContext) -> Option<String> {
    let program = match gl.get_parameter(gl::CURRENT_PROGRAM) {
        Parameter::Program(program) => program,
        _ => return None,
    };

    let name = gl
        .get_attached_shaders(&program)
        .first()
        .and_then(|shader| gl.get_shader_source(shader))
        .and_then(|source| shader_name::shader_name(&source));

    Some(name.unwrap_or_else(|| UNNAMED_SHADER.to_string()))
}
