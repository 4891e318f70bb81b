//! Sample solids for tests, demos and the CLI `sample` command.
//!
//! All generators produce closed, outward-wound meshes in the drawing
//! convention (X right, Y up, Z forward).

use std::f64::consts::TAU;

use draftkit_math::Point3;

use crate::mesh::Mesh;

/// Axis-aligned box with one corner at the origin, spanning
/// `width` along X, `height` along Y and `depth` along Z.
pub fn box_mesh(width: f64, height: f64, depth: f64) -> Mesh {
    let (w, h, d) = (width, height, depth);
    #[rustfmt::skip]
    let vertices = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(w, 0.0, 0.0),
        Point3::new(w, h, 0.0),
        Point3::new(0.0, h, 0.0),
        Point3::new(0.0, 0.0, d),
        Point3::new(w, 0.0, d),
        Point3::new(w, h, d),
        Point3::new(0.0, h, d),
    ];

    #[rustfmt::skip]
    let faces = vec![
        [0, 2, 1], [0, 3, 2], // Back (-Z)
        [4, 5, 6], [4, 6, 7], // Front (+Z)
        [0, 1, 5], [0, 5, 4], // Bottom (-Y)
        [2, 3, 7], [2, 7, 6], // Top (+Y)
        [0, 4, 7], [0, 7, 3], // Left (-X)
        [1, 2, 6], [1, 6, 5], // Right (+X)
    ];

    Mesh::from_parts(vertices, faces)
}

/// Cube of edge length `size`: 8 vertices, 12 triangles.
pub fn cube(size: f64) -> Mesh {
    box_mesh(size, size, size)
}

/// Closed cylinder standing on the XZ plane with its axis along +Y.
///
/// The rims are regular `segments`-gons of the given `radius`; the caps are
/// fans around a center vertex.
pub fn cylinder(radius: f64, height: f64, segments: u32) -> Mesh {
    let n = segments.max(3);
    let mut vertices = Vec::with_capacity(2 + 2 * n as usize);
    vertices.push(Point3::new(0.0, 0.0, 0.0));
    vertices.push(Point3::new(0.0, height, 0.0));
    for i in 0..n {
        let theta = TAU * i as f64 / n as f64;
        let (s, c) = theta.sin_cos();
        vertices.push(Point3::new(radius * c, 0.0, radius * s));
        vertices.push(Point3::new(radius * c, height, radius * s));
    }

    let bottom = |i: u32| 2 + 2 * (i % n);
    let top = |i: u32| 3 + 2 * (i % n);

    let mut faces = Vec::with_capacity(4 * n as usize);
    for i in 0..n {
        let j = i + 1;
        faces.push([bottom(i), top(j), bottom(j)]);
        faces.push([bottom(i), top(i), top(j)]);
        faces.push([1, top(j), top(i)]);
        faces.push([0, bottom(i), bottom(j)]);
    }

    Mesh::from_parts(vertices, faces)
}

/// Straight prism: a CCW profile in the XY plane extruded from `z = 0` to
/// `z = depth`.
///
/// The caps are fan-triangulated from the first profile vertex, so the
/// profile must be star-shaped with respect to it.
pub fn prism(profile: &[(f64, f64)], depth: f64) -> Mesh {
    let n = profile.len() as u32;
    let mut vertices = Vec::with_capacity(2 * profile.len());
    for &(x, y) in profile {
        vertices.push(Point3::new(x, y, 0.0));
    }
    for &(x, y) in profile {
        vertices.push(Point3::new(x, y, depth));
    }

    let back = |i: u32| i % n;
    let front = |i: u32| n + i % n;

    let mut faces = Vec::with_capacity(4 * profile.len());
    for i in 1..n.saturating_sub(1) {
        faces.push([front(0), front(i), front(i + 1)]);
        faces.push([back(0), back(i + 1), back(i)]);
    }
    for i in 0..n {
        let j = i + 1;
        faces.push([back(i), back(j), front(j)]);
        faces.push([back(i), front(j), front(i)]);
    }

    Mesh::from_parts(vertices, faces)
}

/// L-shaped bracket: a 40 x 8 base with an 8-wide upright, 43 tall, 30 deep.
pub fn l_bracket() -> Mesh {
    // Starts at the inner corner so the cap fan stays inside the L.
    let profile = [
        (8.0, 8.0),
        (8.0, 43.0),
        (0.0, 43.0),
        (0.0, 0.0),
        (40.0, 0.0),
        (40.0, 8.0),
    ];
    prism(&profile, 30.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::MeshTopology;
    use approx::assert_relative_eq;

    fn assert_outward(mesh: &Mesh, inside: Point3) {
        let topo = MeshTopology::build(mesh).unwrap();
        for f in 0..topo.num_faces() {
            let outward = topo.face_centroid(f) - inside;
            assert!(
                topo.face_normal(f).dot(&outward) > 0.0,
                "face {f} is wound inward"
            );
        }
    }

    #[test]
    fn test_cube_counts() {
        let mesh = cube(1.0);
        assert_eq!(mesh.num_vertices(), 8);
        assert_eq!(mesh.num_faces(), 12);
    }

    #[test]
    fn test_cylinder_is_closed_and_outward() {
        let mesh = cylinder(10.0, 30.0, 32);
        assert_eq!(mesh.num_faces(), 128);
        let topo = MeshTopology::build(&mesh).unwrap();
        assert!(topo.is_watertight());
        assert_outward(&mesh, Point3::new(0.0, 15.0, 0.0));

        let ext = mesh.extents();
        assert_relative_eq!(ext.width, 20.0, epsilon = 1e-9);
        assert_relative_eq!(ext.height, 30.0, epsilon = 1e-9);
    }

    #[test]
    fn test_bracket_is_closed() {
        let mesh = l_bracket();
        let topo = MeshTopology::build(&mesh).unwrap();
        assert!(topo.is_watertight());
        // Twice the profile area (caps) plus the side walls.
        let perimeter = 2.0 * (40.0 + 43.0);
        assert_relative_eq!(
            topo.surface_area(),
            2.0 * 600.0 + perimeter * 30.0,
            epsilon = 1e-9
        );

        let ext = mesh.extents();
        assert_relative_eq!(ext.width, 40.0);
        assert_relative_eq!(ext.height, 43.0);
        assert_relative_eq!(ext.depth, 30.0);
    }

    #[test]
    fn test_box_is_outward() {
        assert_outward(&box_mesh(2.0, 1.0, 3.0), Point3::new(1.0, 0.5, 1.5));
    }
}
