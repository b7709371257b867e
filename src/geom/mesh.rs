use std::collections::HashMap;

use super::diagnostics::GeomMeshDiagnostics;
use super::{BBox, Point3, Tolerance};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeomMesh {
    pub positions: Vec<[f64; 3]>,
    pub indices: Vec<u32>,
    pub uvs: Option<Vec<[f64; 2]>>,
    pub normals: Option<Vec<[f64; 3]>>,
    /// Tangent vectors for normal mapping (computed from UV gradients when available).
    /// Each tangent is a unit vector in the direction of increasing U.
    pub tangents: Option<Vec<[f64; 3]>>,
}

impl GeomMesh {
    /// Create a new mesh with positions and indices only.
    #[must_use]
    pub fn new(positions: Vec<[f64; 3]>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            indices,
            uvs: None,
            normals: None,
            tangents: None,
        }
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Returns true if any vertex position contains NaN or Inf values.
    #[must_use]
    pub fn has_invalid_vertices(&self) -> bool {
        self.positions
            .iter()
            .any(|p| !p[0].is_finite() || !p[1].is_finite() || !p[2].is_finite())
    }

    /// Returns true if all vertex indices are within bounds.
    #[must_use]
    pub fn has_valid_indices(&self) -> bool {
        let n = self.positions.len() as u32;
        self.indices.iter().all(|&i| i < n)
    }

    /// Returns true if indices represent a triangle list.
    #[must_use]
    pub fn has_triangle_indices(&self) -> bool {
        self.indices.len() % 3 == 0
    }

    /// Returns true if all optional vertex attribute buffers match `positions.len()`.
    #[must_use]
    pub fn has_valid_attribute_lengths(&self) -> bool {
        let n = self.positions.len();
        self.uvs.as_ref().map_or(true, |uvs| uvs.len() == n)
            && self.normals.as_ref().map_or(true, |normals| normals.len() == n)
            && self.tangents.as_ref().map_or(true, |tangents| tangents.len() == n)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.has_triangle_indices() {
            return Err("mesh indices are not a triangle list (len % 3 != 0)".to_string());
        }
        if self.has_invalid_vertices() {
            return Err("mesh has invalid vertex coordinates (NaN/Inf)".to_string());
        }
        if !self.has_valid_indices() {
            return Err("mesh has out-of-bounds vertex indices".to_string());
        }
        if !self.has_valid_attribute_lengths() {
            return Err("mesh attribute buffers do not match vertex count".to_string());
        }
        Ok(())
    }

    #[must_use]
    pub fn bounds(&self) -> Option<BBox> {
        let points: Vec<Point3> = self.positions.iter().copied().map(Point3::from).collect();
        BBox::from_points(&points)
    }

    /// Face normal of triangle `tri` as `(b - a) × (c - a)`, unnormalized.
    #[must_use]
    pub fn face_normal(&self, tri: usize) -> Option<[f64; 3]> {
        let idx = self.indices.get(tri * 3..tri * 3 + 3)?;
        let a = Point3::from(*self.positions.get(idx[0] as usize)?);
        let b = Point3::from(*self.positions.get(idx[1] as usize)?);
        let c = Point3::from(*self.positions.get(idx[2] as usize)?);
        Some((b - a).cross(c - a).to_array())
    }

    /// Returns the position buffer as a flat slice: `[x0, y0, z0, x1, y1, z1, ...]`.
    ///
    /// This is a zero-copy view over `positions`, useful for wasm/JS adapters that
    /// expect packed numeric buffers.
    #[must_use]
    pub fn positions_flat(&self) -> &[f64] {
        flatten_f64_array_slice::<3>(&self.positions)
    }

    /// Returns the UV buffer as a flat slice: `[u0, v0, u1, v1, ...]`.
    #[must_use]
    pub fn uvs_flat(&self) -> Option<&[f64]> {
        self.uvs.as_deref().map(flatten_f64_array_slice::<2>)
    }

    /// Returns the normal buffer as a flat slice: `[nx0, ny0, nz0, nx1, ny1, nz1, ...]`.
    #[must_use]
    pub fn normals_flat(&self) -> Option<&[f64]> {
        self.normals.as_deref().map(flatten_f64_array_slice::<3>)
    }

    /// Returns the tangent buffer as a flat slice: `[tx0, ty0, tz0, tx1, ty1, tz1, ...]`.
    #[must_use]
    pub fn tangents_flat(&self) -> Option<&[f64]> {
        self.tangents.as_deref().map(flatten_f64_array_slice::<3>)
    }
}

fn flatten_f64_array_slice<const N: usize>(data: &[[f64; N]]) -> &[f64] {
    let count = data.len().checked_mul(N).unwrap_or(0);
    let ptr = data.as_ptr().cast::<f64>();
    // SAFETY: `[[f64; N]]` is stored contiguously, and we compute the element count as `len * N`.
    unsafe { std::slice::from_raw_parts(ptr, count) }
}

/// Assembles a road mesh and computes its derived attributes.
///
/// Unlike a general mesher this never welds, culls or re-winds: vertex order
/// and index buffers are part of the output contract and pass through as-is.
pub(crate) fn finalize_road_mesh(
    points: Vec<Point3>,
    uvs: Vec<[f64; 2]>,
    indices: Vec<u32>,
    sample_count: usize,
    tol: Tolerance,
) -> (GeomMesh, GeomMeshDiagnostics) {
    let degenerate_triangle_count = count_degenerate_triangles(&points, &indices, tol);
    let (open_edge_count, non_manifold_edge_count) = count_edge_topology(&indices);

    let mut warnings = Vec::new();
    if degenerate_triangle_count > 0 {
        warnings.push(format!(
            "mesh has {degenerate_triangle_count} zero-area triangles"
        ));
    }
    if non_manifold_edge_count > 0 {
        warnings.push("mesh has non-manifold edges".to_string());
    }

    let normals = compute_smooth_normals(&points, &indices);
    let tangents = compute_tangents(&points, &indices, &uvs, &normals);

    let mesh = GeomMesh {
        positions: points.into_iter().map(|p| p.to_array()).collect(),
        indices,
        uvs: Some(uvs),
        normals: Some(normals),
        tangents: Some(tangents),
    };

    let diagnostics = GeomMeshDiagnostics {
        vertex_count: mesh.positions.len(),
        triangle_count: mesh.triangle_count(),
        sample_count,
        degenerate_triangle_count,
        open_edge_count,
        non_manifold_edge_count,
        timing: None,
        warnings,
    };

    (mesh, diagnostics)
}

fn count_degenerate_triangles(points: &[Point3], indices: &[u32], tol: Tolerance) -> usize {
    indices
        .chunks_exact(3)
        .filter(|tri| {
            let (Some(a), Some(b), Some(c)) = (
                points.get(tri[0] as usize),
                points.get(tri[1] as usize),
                points.get(tri[2] as usize),
            ) else {
                return true;
            };
            let area2 = (*b - *a).cross(*c - *a).length();
            !area2.is_finite() || area2 <= tol.eps
        })
        .count()
}

fn count_edge_topology(indices: &[u32]) -> (usize, usize) {
    let mut edge_counts: HashMap<(u32, u32), u32> = HashMap::new();

    for tri in indices.chunks_exact(3) {
        let i0 = tri[0];
        let i1 = tri[1];
        let i2 = tri[2];

        if i0 == i1 || i1 == i2 || i0 == i2 {
            continue;
        }

        let edges = [(i0, i1), (i1, i2), (i2, i0)];
        for (ea, eb) in edges {
            let (lo, hi) = if ea <= eb { (ea, eb) } else { (eb, ea) };
            *edge_counts.entry((lo, hi)).or_insert(0) += 1;
        }
    }

    let mut open_edge_count = 0usize;
    let mut non_manifold_edge_count = 0usize;
    for (_edge, count) in edge_counts {
        if count == 1 {
            open_edge_count += 1;
        } else if count > 2 {
            non_manifold_edge_count += 1;
        }
    }

    (open_edge_count, non_manifold_edge_count)
}

/// Area-weighted vertex normals. Vertices without faces get +Y.
fn compute_smooth_normals(points: &[Point3], indices: &[u32]) -> Vec<[f64; 3]> {
    let mut normals = vec![[0.0, 0.0, 0.0]; points.len()];

    for tri in indices.chunks_exact(3) {
        let i0 = tri[0] as usize;
        let i1 = tri[1] as usize;
        let i2 = tri[2] as usize;

        let (Some(a), Some(b), Some(c)) = (points.get(i0), points.get(i1), points.get(i2)) else {
            continue;
        };

        let n = (*b - *a).cross(*c - *a);
        for i in [i0, i1, i2] {
            normals[i][0] += n.x;
            normals[i][1] += n.y;
            normals[i][2] += n.z;
        }
    }

    for n in &mut normals {
        let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
        if len.is_finite() && len > 0.0 {
            let inv = 1.0 / len;
            n[0] *= inv;
            n[1] *= inv;
            n[2] *= inv;
        } else {
            *n = [0.0, 1.0, 0.0];
        }
    }

    normals
}

/// Compute tangent vectors from UV gradients.
///
/// Each tangent points along increasing U and is orthogonalized against the
/// vertex normal. Degenerate UV triangles contribute nothing; vertices left
/// without a tangent get an arbitrary vector perpendicular to the normal.
fn compute_tangents(
    points: &[Point3],
    indices: &[u32],
    uvs: &[[f64; 2]],
    normals: &[[f64; 3]],
) -> Vec<[f64; 3]> {
    let mut tangents = vec![[0.0, 0.0, 0.0]; points.len()];

    for tri in indices.chunks_exact(3) {
        let i0 = tri[0] as usize;
        let i1 = tri[1] as usize;
        let i2 = tri[2] as usize;

        let (Some(p0), Some(p1), Some(p2)) = (points.get(i0), points.get(i1), points.get(i2)) else {
            continue;
        };
        let (Some(uv0), Some(uv1), Some(uv2)) = (uvs.get(i0), uvs.get(i1), uvs.get(i2)) else {
            continue;
        };

        let edge1 = *p1 - *p0;
        let edge2 = *p2 - *p0;

        let du1 = uv1[0] - uv0[0];
        let dv1 = uv1[1] - uv0[1];
        let du2 = uv2[0] - uv0[0];
        let dv2 = uv2[1] - uv0[1];

        let det = du1 * dv2 - du2 * dv1;
        if det.abs() < 1e-12 {
            continue;
        }

        let t = (edge1 * dv2 - edge2 * dv1) / det;
        for i in [i0, i1, i2] {
            tangents[i][0] += t.x;
            tangents[i][1] += t.y;
            tangents[i][2] += t.z;
        }
    }

    for (i, t) in tangents.iter_mut().enumerate() {
        let n = normals.get(i).copied().map_or(super::Vec3::Y, super::Vec3::from);
        let raw = super::Vec3::from(*t);

        // Gram-Schmidt: T' = T - (N dot T) * N
        let ortho = raw - n * n.dot(raw);
        *t = ortho.normalized().unwrap_or_else(|| n.any_perpendicular()).to_array();
    }

    tangents
}
