use glam::Vec3;

/// CPU-side triangle mesh. Positions and normals are parallel arrays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Append another mesh, rebasing its indices.
    pub fn merge(&mut self, other: &MeshData) {
        let base = self.positions.len() as u32;
        self.positions.extend_from_slice(&other.positions);
        self.normals.extend_from_slice(&other.normals);
        self.indices.extend(other.indices.iter().map(|i| i + base));
    }

    /// Axis-aligned bounds as (min, max). `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut iter = self.positions.iter().map(|p| Vec3::from_array(*p));
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
    }

    /// Size of the bounding box, zero for an empty mesh.
    pub fn extent(&self) -> Vec3 {
        self.bounds().map(|(lo, hi)| hi - lo).unwrap_or(Vec3::ZERO)
    }

    /// Recompute smooth vertex normals from the triangle list.
    ///
    /// Face normals are accumulated unnormalized, so larger faces weigh more.
    pub fn compute_vertex_normals(&mut self) {
        let mut acc = vec![Vec3::ZERO; self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            let (va, vb, vc) = (
                Vec3::from_array(self.positions[a]),
                Vec3::from_array(self.positions[b]),
                Vec3::from_array(self.positions[c]),
            );
            let face = (vc - vb).cross(va - vb);
            acc[a] += face;
            acc[b] += face;
            acc[c] += face;
        }
        self.normals = acc
            .into_iter()
            .map(|n| n.normalize_or_zero().to_array())
            .collect();
    }
}

/// Flat plane in the XY plane facing +Z, centred on the origin.
///
/// `width` runs along X and `height` along Y, split into the given number of
/// segments. Rows are emitted top to bottom.
pub fn plane(width: f32, height: f32, width_segments: u32, height_segments: u32) -> MeshData {
    let grid_x = width_segments.max(1);
    let grid_y = height_segments.max(1);
    let (half_w, half_h) = (width / 2.0, height / 2.0);
    let (seg_w, seg_h) = (width / grid_x as f32, height / grid_y as f32);

    let mut mesh = MeshData::new("plane");
    for iy in 0..=grid_y {
        let y = iy as f32 * seg_h - half_h;
        for ix in 0..=grid_x {
            let x = ix as f32 * seg_w - half_w;
            mesh.positions.push([x, -y, 0.0]);
            mesh.normals.push([0.0, 0.0, 1.0]);
        }
    }

    let row = grid_x + 1;
    for iy in 0..grid_y {
        for ix in 0..grid_x {
            let a = ix + row * iy;
            let b = ix + row * (iy + 1);
            let c = (ix + 1) + row * (iy + 1);
            let d = (ix + 1) + row * iy;
            mesh.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }
    mesh
}

/// Bend a plane built by [`plane`] into a roadside bank.
///
/// The inner edge (x = -width/2) stays flat and the surface drops
/// parabolically towards the outer edge: `z = -((x / (width/2)) + 1)² · strength`.
pub fn curve_bank(mesh: &mut MeshData, width: f32, strength: f32) {
    let half = width / 2.0;
    for p in &mut mesh.positions {
        let normalized = p[0] / half;
        p[2] = -(normalized + 1.0).powi(2) * strength;
    }
    mesh.compute_vertex_normals();
}

/// Axis-aligned box with flat-shaded faces.
pub fn cuboid(size: Vec3, center: Vec3) -> MeshData {
    let h = size / 2.0;
    let faces: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    ];

    let mut mesh = MeshData::new("cuboid");
    for (normal, u, v) in faces {
        let base = mesh.positions.len() as u32;
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let p = center + (normal + u * su + v * sv) * h;
            mesh.positions.push(p.to_array());
            mesh.normals.push(normal.to_array());
        }
        mesh.indices
            .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    mesh
}

fn assemble(name: &str, parts: &[MeshData]) -> MeshData {
    let mut mesh = MeshData::new(name);
    for part in parts {
        mesh.merge(part);
    }
    mesh
}

/// Stand-in street light: pole, arm and lamp head, in model units.
pub fn proxy_street_light() -> MeshData {
    assemble(
        "proxy_street_light",
        &[
            cuboid(Vec3::new(0.3, 0.4, 0.3), Vec3::new(0.0, 0.2, 0.0)),
            cuboid(Vec3::new(0.15, 8.0, 0.15), Vec3::new(0.0, 4.0, 0.0)),
            cuboid(Vec3::new(2.0, 0.12, 0.12), Vec3::new(1.0, 8.0, 0.0)),
            cuboid(Vec3::new(0.6, 0.15, 0.35), Vec3::new(2.0, 7.9, 0.0)),
        ],
    )
}

/// Stand-in jersey barrier, long along Z so neighbours touch at 0.3 scale.
pub fn proxy_road_barrier() -> MeshData {
    assemble(
        "proxy_road_barrier",
        &[
            cuboid(Vec3::new(1.2, 0.6, 8.8), Vec3::new(0.0, 0.3, 0.0)),
            cuboid(Vec3::new(0.5, 1.6, 8.8), Vec3::new(0.0, 1.4, 0.0)),
        ],
    )
}

/// Stand-in moped with rider.
pub fn proxy_rider() -> MeshData {
    assemble(
        "proxy_rider",
        &[
            cuboid(Vec3::new(0.35, 0.7, 1.6), Vec3::new(0.0, 0.35, 0.0)),
            cuboid(Vec3::new(0.4, 0.8, 0.45), Vec3::new(0.0, 1.0, 0.15)),
            cuboid(Vec3::new(0.3, 0.3, 0.3), Vec3::new(0.0, 1.6, 0.15)),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_vertex_and_index_counts() {
        let mesh = plane(1.5, 30.0, 10, 42);
        assert_eq!(mesh.vertex_count(), 11 * 43);
        assert_eq!(mesh.triangle_count(), 10 * 42 * 2);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertex_count()));
    }

    #[test]
    fn plane_is_centred_and_faces_plus_z() {
        let mut mesh = plane(7.0, 30.0, 1, 1);
        let (lo, hi) = mesh.bounds().unwrap();
        assert_eq!(lo, Vec3::new(-3.5, -15.0, 0.0));
        assert_eq!(hi, Vec3::new(3.5, 15.0, 0.0));

        // Winding agrees with the declared normal
        mesh.compute_vertex_normals();
        for n in &mesh.normals {
            assert!((n[2] - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn bank_is_flat_inside_and_drops_outside() {
        let width = 1.5;
        let strength = 0.25;
        let mut mesh = plane(width, 30.0, 10, 42);
        curve_bank(&mut mesh, width, strength);

        for p in &mesh.positions {
            if (p[0] + width / 2.0).abs() < 1e-6 {
                assert!(p[2].abs() < 1e-6);
            }
            if (p[0] - width / 2.0).abs() < 1e-6 {
                assert!((p[2] + 4.0 * strength).abs() < 1e-5);
            }
        }
        // Normals tilt outward (+X) once the surface slopes down
        let outer = mesh
            .positions
            .iter()
            .position(|p| (p[0] - width / 2.0).abs() < 1e-6)
            .unwrap();
        assert!(mesh.normals[outer][0] > 0.0);
    }

    #[test]
    fn cuboid_bounds_match_size() {
        let mesh = cuboid(Vec3::new(2.0, 4.0, 6.0), Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.triangle_count(), 12);
        let (lo, hi) = mesh.bounds().unwrap();
        assert_eq!(lo, Vec3::new(-1.0, 0.0, -3.0));
        assert_eq!(hi, Vec3::new(1.0, 4.0, 3.0));
    }

    #[test]
    fn cuboid_winding_matches_face_normals() {
        let mut mesh = cuboid(Vec3::ONE, Vec3::ZERO);
        let declared = mesh.normals.clone();
        mesh.compute_vertex_normals();
        // Shared corners are not shared vertices, so per-face normals survive
        for (a, b) in declared.iter().zip(&mesh.normals) {
            assert!(Vec3::from_array(*a).dot(Vec3::from_array(*b)) > 0.99);
        }
    }

    #[test]
    fn merge_rebases_indices() {
        let mut a = cuboid(Vec3::ONE, Vec3::ZERO);
        let b = cuboid(Vec3::ONE, Vec3::X * 3.0);
        a.merge(&b);
        assert_eq!(a.vertex_count(), 48);
        assert_eq!(*a.indices.iter().max().unwrap(), 47);
    }

    #[test]
    fn proxies_stand_on_the_ground() {
        for mesh in [proxy_street_light(), proxy_road_barrier(), proxy_rider()] {
            let (lo, _) = mesh.bounds().unwrap();
            assert!(lo.y.abs() < 1e-6, "{} floats", mesh.name);
        }
    }
}
