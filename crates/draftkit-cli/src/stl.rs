//! STL import.
//!
//! Reads ASCII or binary STL, welds coincident corners into shared vertices
//! and moves the part into drawing axes: STL is Z-up, drawings are Y-up with
//! the front toward +Z. The result is centered on X and Z with its base at
//! `y = 0`.

use std::path::Path;

use draftkit_math::Point3;
use draftkit_mesh::{Mesh, MeshError};
use indexmap::IndexMap;
use thiserror::Error;
use tracing::debug;

const HEADER_SIZE: usize = 80;
const TRIANGLE_SIZE: usize = 50;

/// One triangle as stored in the file.
pub type Facet = [[f32; 3]; 3];

/// Errors reading an STL file.
#[derive(Error, Debug)]
pub enum StlError {
    /// File could not be read.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Neither a well-formed binary nor an ASCII STL.
    #[error("not an STL file: {0}")]
    Format(String),

    /// A vertex line with unparsable coordinates.
    #[error("bad vertex on line {line}: {text}")]
    BadVertex {
        /// 1-based line number.
        line: usize,
        /// The offending line.
        text: String,
    },

    /// The welded mesh failed validation.
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// Load `path` as a mesh in drawing axes.
pub fn load_stl(path: impl AsRef<Path>) -> Result<Mesh, StlError> {
    let bytes = std::fs::read(path)?;
    let facets = parse_stl(&bytes)?;
    let (mut vertices, faces) = weld(&facets);
    to_drawing_axes(&mut vertices);
    Ok(Mesh::new(vertices, faces)?)
}

/// Parse STL bytes into raw facets.
pub fn parse_stl(bytes: &[u8]) -> Result<Vec<Facet>, StlError> {
    if let Some(count) = binary_facet_count(bytes) {
        return Ok(parse_binary(bytes, count));
    }
    let text = std::str::from_utf8(bytes)
        .map_err(|_| StlError::Format("binary size does not match facet count".into()))?;
    if !text.trim_start().starts_with("solid") {
        return Err(StlError::Format("missing 'solid' header".into()));
    }
    parse_ascii(text)
}

/// Facet count of a binary file whose length matches its header.
fn binary_facet_count(bytes: &[u8]) -> Option<usize> {
    let count_bytes = bytes.get(HEADER_SIZE..HEADER_SIZE + 4)?;
    let count = u32::from_le_bytes(count_bytes.try_into().ok()?) as usize;
    (bytes.len() == HEADER_SIZE + 4 + count * TRIANGLE_SIZE).then_some(count)
}

fn parse_binary(bytes: &[u8], count: usize) -> Vec<Facet> {
    let body = &bytes[HEADER_SIZE + 4..];
    body.chunks_exact(TRIANGLE_SIZE)
        .take(count)
        .map(|tri| {
            // Skip the stored normal.
            let corner = |i: usize| {
                let at = 12 + i * 12;
                let f = |o: usize| {
                    let b = &tri[at + o..at + o + 4];
                    f32::from_le_bytes([b[0], b[1], b[2], b[3]])
                };
                [f(0), f(4), f(8)]
            };
            [corner(0), corner(1), corner(2)]
        })
        .collect()
}

fn parse_ascii(text: &str) -> Result<Vec<Facet>, StlError> {
    let mut facets = Vec::new();
    let mut corners: Vec<[f32; 3]> = Vec::with_capacity(3);

    for (n, line) in text.lines().enumerate() {
        let mut parts = line.split_whitespace();
        match parts.next().map(str::to_ascii_lowercase).as_deref() {
            Some("outer") => corners.clear(),
            Some("vertex") => {
                let coords: Vec<f32> = parts.filter_map(|p| p.parse().ok()).collect();
                let [x, y, z] = coords[..] else {
                    return Err(StlError::BadVertex {
                        line: n + 1,
                        text: line.trim().to_string(),
                    });
                };
                corners.push([x, y, z]);
            }
            Some("endfacet") => {
                if let [a, b, c] = corners[..] {
                    facets.push([a, b, c]);
                }
                corners.clear();
            }
            Some("endsolid") => break,
            _ => {}
        }
    }
    Ok(facets)
}

/// Merge bit-identical corners into shared vertices.
///
/// Facets that collapse onto fewer than three distinct vertices are dropped.
pub fn weld(facets: &[Facet]) -> (Vec<Point3>, Vec<[u32; 3]>) {
    let mut index: IndexMap<[u32; 3], u32> = IndexMap::new();
    let mut faces = Vec::with_capacity(facets.len());

    for facet in facets {
        let mut face = [0u32; 3];
        for (slot, corner) in face.iter_mut().zip(facet) {
            let key = (*corner).map(f32::to_bits);
            let next = index.len() as u32;
            *slot = *index.entry(key).or_insert(next);
        }
        if face[0] != face[1] && face[1] != face[2] && face[0] != face[2] {
            faces.push(face);
        }
    }

    let vertices: Vec<Point3> = index
        .keys()
        .map(|bits| {
            let [x, y, z] = (*bits).map(f32::from_bits);
            Point3::new(f64::from(x), f64::from(y), f64::from(z))
        })
        .collect();
    debug!(
        facets = facets.len(),
        vertices = vertices.len(),
        faces = faces.len(),
        "welded STL"
    );
    (vertices, faces)
}

/// Turn Z-up STL coordinates into drawing axes, then center on X and Z and
/// rest the part on `y = 0`.
///
/// `(x, y, z) -> (x, z, -y)` is a proper rotation, so winding is kept.
pub fn to_drawing_axes(vertices: &mut [Point3]) {
    for v in vertices.iter_mut() {
        *v = Point3::new(v.x, v.z, -v.y);
    }
    let Some(first) = vertices.first().copied() else {
        return;
    };
    let (min, max) = vertices
        .iter()
        .fold((first, first), |(lo, hi), v| (lo.inf(v), hi.sup(v)));
    let cx = (min.x + max.x) / 2.0;
    let cz = (min.z + max.z) / 2.0;
    for v in vertices.iter_mut() {
        v.x -= cx;
        v.y -= min.y;
        v.z -= cz;
    }
}
