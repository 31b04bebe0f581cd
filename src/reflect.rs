//! Finds the `struct Material` block in GLSL source and lists its members.
//!
//! Only members of that block are considered editable. Everything else the
//! shader declares (matrices, lighting inputs, ...) is set by the renderer.
//!
//! ```glsl
//! struct Material {
//!     vec3 color;
//!     sampler2D diffuse;
//! };
//! uniform Material material;
//! ```

use log::warn;

use crate::uniform::{UniformDeclaration, UniformType};

const MARKERS: [&str; 2] = ["struct Material", "struct material"];

/// Extracts the declarations of the material block, in declaration order.
///
/// Scanning starts after the first line containing a marker and stops at the
/// first `}` that follows it. The opening brace may sit on the marker line or
/// start a later one. Unsupported type keywords are logged and
/// skipped. A source without a material block yields an empty schema.
pub fn extract(source: &str) -> Vec<UniformDeclaration> {
    let mut uniforms = Vec::new();
    let mut lines = source.lines();

    let Some(first) = lines.by_ref().find_map(block_start) else {
        return uniforms;
    };

    for line in std::iter::once(first).chain(lines) {
        let line = line.split("//").next().unwrap_or_default().trim_start();
        // brace on its own line below the marker
        let line = line.strip_prefix('{').unwrap_or(line);
        let (body, closed) = match line.find('}') {
            Some(end) => (&line[..end], true),
            None => (line, false),
        };

        for statement in body.split(';') {
            if let Some(declaration) = parse_declaration(statement) {
                uniforms.push(declaration);
            }
        }

        if closed {
            break;
        }
    }

    uniforms
}

/// Returns what follows the opening brace on the marker line, or `""` when the
/// brace sits on a later line.
fn block_start(line: &str) -> Option<&str> {
    let at = MARKERS.iter().find_map(|marker| line.find(marker))?;
    let rest = &line[at..];
    Some(rest.find('{').map_or("", |brace| &rest[brace + 1..]))
}

fn parse_declaration(statement: &str) -> Option<UniformDeclaration> {
    let mut tokens = statement.split_whitespace();
    let (keyword, name) = (tokens.next()?, tokens.next()?);
    let name = name.trim_end_matches(';');

    match UniformType::from_keyword(keyword) {
        Ok(ty) => Some(UniformDeclaration::new(ty, name)),
        Err(e) => {
            warn!("{e} (skipping `{name}`)");
            None
        }
    }
}
