//! Wavefront OBJ format support.
//!
//! Reads `v`, `vt` and `f` records; normals, groups, materials and smoothing
//! records are skipped. Faces may have any number of corners, and corner
//! references may be negative (relative to the end of the list so far).
//! When a corner carries a `vt` reference its UV is loaded onto the corner.
//!
//! Saving writes one `vt` per face corner, so UV seams survive a round trip.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::{Point2, Point3};

use crate::error::{MeshError, Result};
use crate::mesh::{build_from_polygons, to_face_vertex, MeshIndex, PolyMesh};

/// Load a mesh from an OBJ file.
///
/// # Example
///
/// ```no_run
/// use texelgrid::io::obj;
/// use texelgrid::mesh::PolyMesh;
///
/// let mesh: PolyMesh = obj::load("level.obj").unwrap();
/// ```
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<PolyMesh<I>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    read(BufReader::new(file), path)
}

/// Parse OBJ data. `path` is only used in error messages.
pub fn read<R: BufRead, I: MeshIndex>(reader: R, path: &Path) -> Result<PolyMesh<I>> {
    let mut positions: Vec<Point3<f64>> = Vec::new();
    let mut uvs: Vec<Point2<f64>> = Vec::new();
    let mut faces: Vec<Vec<usize>> = Vec::new();
    let mut face_uvs: Vec<Vec<Option<usize>>> = Vec::new();

    for (line_index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_number = line_index + 1;
        let fail = |message: String| MeshError::LoadError {
            path: path.to_path_buf(),
            message: format!("line {line_number}: {message}"),
        };

        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("v") => {
                let [x, y, z]: [f64; 3] = parse_floats(&mut tokens).map_err(fail)?;
                positions.push(Point3::new(x, y, z));
            }
            Some("vt") => {
                let [u, v]: [f64; 2] = parse_floats(&mut tokens).map_err(fail)?;
                uvs.push(Point2::new(u, v));
            }
            Some("f") => {
                let mut corners = Vec::new();
                let mut corner_uvs = Vec::new();
                for token in tokens {
                    let mut refs = token.split('/');
                    let vertex = refs
                        .next()
                        .ok_or_else(|| fail(format!("empty corner '{token}'")))
                        .and_then(|r| resolve(r, positions.len()).map_err(&fail))?;
                    let uv = match refs.next() {
                        Some("") | None => None,
                        Some(r) => Some(resolve(r, uvs.len()).map_err(&fail)?),
                    };
                    corners.push(vertex);
                    corner_uvs.push(uv);
                }
                if corners.len() < 3 {
                    return Err(fail(format!("face has {} corners", corners.len())));
                }
                faces.push(corners);
                face_uvs.push(corner_uvs);
            }
            _ => {}
        }
    }

    let mut mesh: PolyMesh<I> = build_from_polygons(&positions, &faces)?;
    let face_ids: Vec<_> = mesh.face_ids().collect();
    for (f, corner_uvs) in face_ids.into_iter().zip(&face_uvs) {
        for (i, uv) in corner_uvs.iter().enumerate() {
            if let Some(t) = uv {
                mesh.set_uv(f, i, uvs[*t]);
            }
        }
    }
    Ok(mesh)
}

fn parse_floats<'a, const N: usize>(
    tokens: &mut impl Iterator<Item = &'a str>,
) -> std::result::Result<[f64; N], String> {
    let mut values = [0.0; N];
    for value in &mut values {
        let token = tokens
            .next()
            .ok_or_else(|| format!("expected {N} coordinates"))?;
        *value = token
            .parse()
            .map_err(|_| format!("invalid number '{token}'"))?;
    }
    Ok(values)
}

/// Turn a 1-based (or negative, relative) OBJ reference into an index.
fn resolve(reference: &str, len: usize) -> std::result::Result<usize, String> {
    let value: i64 = reference
        .parse()
        .map_err(|_| format!("invalid index '{reference}'"))?;
    let index = if value > 0 {
        value - 1
    } else if value < 0 {
        len as i64 + value
    } else {
        return Err("index 0 is not valid".to_string());
    };
    if index < 0 || index as usize >= len {
        return Err(format!("index {value} out of range ({len} defined)"));
    }
    Ok(index as usize)
}

/// Save a mesh with its corner UVs to an OBJ file.
///
/// # Example
///
/// ```no_run
/// use texelgrid::io::obj;
/// use texelgrid::mesh::PolyMesh;
///
/// let mesh: PolyMesh = PolyMesh::new();
/// obj::save(&mesh, "output.obj").unwrap();
/// ```
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &PolyMesh<I>, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write(mesh, &mut writer)
        .and_then(|_| writer.flush())
        .map_err(|e| MeshError::SaveError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Write OBJ data.
pub fn write<W: Write, I: MeshIndex>(mesh: &PolyMesh<I>, writer: &mut W) -> std::io::Result<()> {
    let (vertices, faces) = to_face_vertex(mesh);

    writeln!(writer, "# texelgrid")?;
    for p in &vertices {
        writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
    }
    for f in mesh.face_ids() {
        for uv in mesh.face_uvs(f) {
            writeln!(writer, "vt {} {}", uv.x, uv.y)?;
        }
    }

    let mut next_uv = 1;
    for face in &faces {
        write!(writer, "f")?;
        for &v in face {
            write!(writer, " {}/{}", v + 1, next_uv)?;
            next_uv += 1;
        }
        writeln!(writer)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::FaceId;

    fn parse(data: &str) -> Result<PolyMesh> {
        read(data.as_bytes(), Path::new("test.obj"))
    }

    #[test]
    fn test_read_quads_with_uvs() {
        let data = "\
# two walls
v 0 0 0
v 1 0 0
v 1 0 1
v 0 0 1
v 2 0 0
v 2 0 1
vt 0 0
vt 0.5 0
vt 0.5 1
vn 0 -1 0
f 1/1/1 2/2/1 3/3/1 4//1
f 2 5 6 3
";
        let mesh = parse(data).unwrap();
        assert_eq!(mesh.num_vertices(), 6);
        assert_eq!(mesh.num_faces(), 2);
        assert_eq!(mesh.uv(FaceId::new(0), 1), Point2::new(0.5, 0.0));
        assert_eq!(mesh.uv(FaceId::new(0), 3), Point2::origin());
        assert_eq!(mesh.face_uvs(FaceId::new(1)), vec![Point2::origin(); 4]);
    }

    #[test]
    fn test_negative_indices_and_ngons() {
        let data = "\
v 0 0 0
v 1 0 0
v 1 0 1
v 0.5 0 1.5
v 0 0 1
f -5 -4 -3 -2 -1
";
        let mesh = parse(data).unwrap();
        assert_eq!(mesh.face_len(FaceId::new(0)), 5);
        assert_eq!(mesh.face(FaceId::new(0)).corners[4].vertex.index(), 4);
    }

    #[test]
    fn test_errors_report_line() {
        let err = parse("v 0 0 0\nv 1 0 0\nf 1 2 9\n").unwrap_err();
        match err {
            MeshError::LoadError { message, .. } => assert!(message.starts_with("line 3:")),
            other => panic!("unexpected error {other:?}"),
        }

        assert!(matches!(parse("v 0 zero 0\n"), Err(MeshError::LoadError { .. })));
        assert!(matches!(parse("v 0 0 0\nf 1 0 1\n"), Err(MeshError::LoadError { .. })));
        assert!(matches!(parse("v 0 0 0\n"), Err(MeshError::EmptyMesh)));
    }

    #[test]
    fn test_write_read_keeps_corner_uvs() {
        let data = "\
v 0 0 0
v 1 0 0
v 1 0 1
v 0 0 1
v 2 0 0
v 2 0 1
f 1 2 3 4
f 2 5 6 3
";
        let mut mesh = parse(data).unwrap();
        // The shared vertices get different UVs on each face
        let f1 = FaceId::new(1);
        mesh.set_uv(f1, 0, Point2::new(0.3125, 0.0));
        mesh.set_uv(f1, 3, Point2::new(0.3125, 0.1));

        let mut out = Vec::new();
        write(&mesh, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("f 2/5 5/6 6/7 3/8"));

        let back = parse(&text).unwrap();
        assert_eq!(back.num_faces(), 2);
        for f in mesh.face_ids() {
            assert_eq!(back.face_uvs(f), mesh.face_uvs(f));
        }
    }
}
