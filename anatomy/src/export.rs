//! Mesh export: Wavefront OBJ, skinned JSON and an interleaved vertex buffer

use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::assembler::CreatureMesh;
use crate::error::ExportError;
use crate::geometry::MAX_INFLUENCES;

/// One vertex of the interleaved renderer hand-off buffer
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct SkinnedVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub joints: [u16; MAX_INFLUENCES],
    pub weights: [f32; MAX_INFLUENCES],
}

impl CreatureMesh {
    /// Interleave the merged attributes, one entry per vertex
    pub fn interleaved(&self) -> Vec<SkinnedVertex> {
        let g = &self.geometry;
        (0..g.vertex_count())
            .map(|i| SkinnedVertex {
                position: g.positions[i],
                normal: g.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                uv: g.uvs.get(i).copied().unwrap_or_default(),
                joints: g.skin_indices.get(i).copied().unwrap_or_default(),
                weights: g.skin_weights.get(i).copied().unwrap_or([1.0, 0.0, 0.0, 0.0]),
            })
            .collect()
    }
}

/// Raw bytes of an interleaved buffer, ready for upload
pub fn vertex_bytes(vertices: &[SkinnedVertex]) -> &[u8] {
    bytemuck::cast_slice(vertices)
}

/// Render a mesh as OBJ text, one group per body part
pub fn to_obj_string(mesh: &CreatureMesh, name: &str) -> String {
    let g = &mesh.geometry;
    let mut out = String::with_capacity(g.vertex_count() * 64);
    let _ = writeln!(out, "# {} vertices, {} triangles", g.vertex_count(), g.triangle_count());
    let _ = writeln!(out, "o {name}");

    for p in &g.positions {
        let _ = writeln!(out, "v {} {} {}", p[0], p[1], p[2]);
    }
    for uv in &g.uvs {
        let _ = writeln!(out, "vt {} {}", uv[0], uv[1]);
    }
    for n in &g.normals {
        let _ = writeln!(out, "vn {} {} {}", n[0], n[1], n[2]);
    }

    let has_uvs = g.has_uvs();
    let has_normals = g.has_normals();
    let corner = |i: usize| {
        // OBJ indices are 1-based
        let i = i + 1;
        match (has_uvs, has_normals) {
            (true, true) => format!("{i}/{i}/{i}"),
            (false, true) => format!("{i}//{i}"),
            (true, false) => format!("{i}/{i}"),
            (false, false) => format!("{i}"),
        }
    };

    let triangles = g.triangles();
    let write_faces = |tris: &[[usize; 3]], out: &mut String| {
        for [a, b, c] in tris {
            let _ = writeln!(out, "f {} {} {}", corner(*a), corner(*b), corner(*c));
        }
    };

    if mesh.part_ranges.is_empty() || g.is_indexed() {
        write_faces(&triangles, &mut out);
    } else {
        // Non-indexed: part ranges are whole triangles
        for range in &mesh.part_ranges {
            let _ = writeln!(out, "g {}", range.name);
            let first = range.start / 3;
            let last = ((range.start + range.count) / 3).min(triangles.len());
            write_faces(&triangles[first..last], &mut out);
        }
    }
    out
}

/// Write a mesh as an OBJ file
pub fn write_obj(mesh: &CreatureMesh, path: &Path, name: &str) -> Result<(), ExportError> {
    let mut w = BufWriter::new(File::create(path)?);
    w.write_all(to_obj_string(mesh, name).as_bytes())?;
    w.flush()?;
    Ok(())
}

/// Write the full skinned mesh (attributes, joints, inverse binds) as JSON
pub fn write_skinned_json(mesh: &CreatureMesh, path: &Path) -> Result<(), ExportError> {
    let mut w = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut w, mesh)?;
    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::CreatureAssembler;
    use crate::blueprint::BodyPartDecl;
    use crate::chain::{Chain, ChainSet};
    use crate::skeleton::{BoneDef, Skeleton};
    use serde_json::{Value, json};

    fn mesh() -> CreatureMesh {
        let skeleton = Skeleton::from_bones(&[
            BoneDef::new("a", None, [0.0, 0.0, 0.0]),
            BoneDef::new("b", Some("a"), [0.0, 0.0, 1.0]),
        ])
        .unwrap();
        let chains: ChainSet = [Chain::new("body", &["a", "b"])].into_iter().collect();
        let parts = [
            BodyPartDecl::new("body", "limb", "body", json!({ "sides": 4 })),
            BodyPartDecl::new("nub", "head", "body", json!({ "radius": 0.2, "sides": 6 })),
        ];
        CreatureAssembler::new().build(skeleton, &parts, &chains).mesh
    }

    #[test]
    fn test_skinned_vertex_layout() {
        assert_eq!(std::mem::size_of::<SkinnedVertex>(), 56);
        let mesh = mesh();
        let vertices = mesh.interleaved();
        assert_eq!(vertices.len(), mesh.vertex_count());
        assert_eq!(vertex_bytes(&vertices).len(), vertices.len() * 56);
        let sum: f32 = vertices[0].weights.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_obj_groups_and_faces() {
        let mesh = mesh();
        let obj = to_obj_string(&mesh, "critter");
        assert!(obj.contains("o critter"));
        assert!(obj.contains("g body"));
        assert!(obj.contains("g nub"));
        let faces = obj.lines().filter(|l| l.starts_with("f ")).count();
        assert_eq!(faces, mesh.triangle_count());
        let vertices = obj.lines().filter(|l| l.starts_with("v ")).count();
        assert_eq!(vertices, mesh.vertex_count());
        assert!(obj.contains("f 1/1/1 2/2/2 3/3/3"));
    }

    #[test]
    fn test_write_obj_and_json() {
        let mesh = mesh();
        let dir = tempfile::tempdir().unwrap();

        let obj_path = dir.path().join("critter.obj");
        write_obj(&mesh, &obj_path, "critter").unwrap();
        assert!(std::fs::metadata(&obj_path).unwrap().len() > 0);

        let json_path = dir.path().join("critter.json");
        write_skinned_json(&mesh, &json_path).unwrap();
        let value: Value =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(value["jointNames"], json!(["a", "b"]));
        assert_eq!(value["inverseBindMatrices"].as_array().unwrap().len(), 2);
        assert_eq!(
            value["geometry"]["positions"].as_array().unwrap().len(),
            mesh.vertex_count()
        );
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let mesh = mesh();
        let err = write_obj(&mesh, Path::new("/nonexistent/dir/x.obj"), "x").unwrap_err();
        assert!(matches!(err, ExportError::Io(_)));
    }
}
