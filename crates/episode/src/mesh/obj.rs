use super::{MeshVertex, ObjModel, ObjObject, ObjPart};
use crate::error::{DataError, Result};
use glam::Vec3;
use std::io::{BufRead, BufReader, Read};

/// Parse the floats following an OBJ/MTL keyword, requiring at least `min`.
pub(super) fn parse_floats<'a>(
    parts: impl Iterator<Item = &'a str>,
    min: usize,
    line: usize,
    on_err: fn(usize, String) -> DataError,
) -> Result<Vec<f32>> {
    let values = parts
        .map(|s| {
            s.parse::<f32>()
                .map_err(|e| on_err(line, format!("bad number '{s}': {e}")))
        })
        .collect::<Result<Vec<_>>>()?;

    if values.len() < min {
        return Err(on_err(
            line,
            format!("expected {min} numbers, found {}", values.len()),
        ));
    }
    Ok(values)
}

/// Turn a 1-based (or negative, relative) OBJ index into a 0-based one.
fn resolve_index(raw: &str, len: usize, line: usize) -> Result<usize> {
    let idx: i64 = raw
        .parse()
        .map_err(|_| DataError::obj(line, format!("bad index '{raw}'")))?;

    let resolved = match idx {
        0 => return Err(DataError::obj(line, "index 0 is not valid in OBJ")),
        i if i > 0 => i - 1,
        i => len as i64 + i,
    };

    if resolved < 0 || resolved as usize >= len {
        return Err(DataError::obj(
            line,
            format!("index {idx} out of range (have {len})"),
        ));
    }
    Ok(resolved as usize)
}

#[derive(Clone, Copy)]
struct Corner {
    position: usize,
    uv: Option<usize>,
    normal: Option<usize>,
}

#[derive(Default)]
struct Builder {
    positions: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    normals: Vec<[f32; 3]>,
    objects: Vec<ObjObject>,
    material_libs: Vec<String>,
    current_material: Option<String>,
}

impl Builder {
    fn start_object(&mut self, name: &str) {
        self.objects.push(ObjObject {
            name: name.to_owned(),
            parts: vec![ObjPart {
                material: self.current_material.clone(),
                vertices: Vec::new(),
            }],
        });
    }

    fn current_object(&mut self) -> &mut ObjObject {
        if self.objects.is_empty() {
            self.start_object("");
        }
        let last = self.objects.len() - 1;
        &mut self.objects[last]
    }

    fn use_material(&mut self, name: &str) {
        self.current_material = Some(name.to_owned());
        let object = self.current_object();
        match object.parts.last_mut() {
            Some(part) if part.vertices.is_empty() => part.material = Some(name.to_owned()),
            _ => object.parts.push(ObjPart {
                material: Some(name.to_owned()),
                vertices: Vec::new(),
            }),
        }
    }

    fn corner(&self, token: &str, line: usize) -> Result<Corner> {
        let mut fields = token.split('/');
        let position = resolve_index(
            fields.next().unwrap_or_default(),
            self.positions.len(),
            line,
        )?;
        let uv = match fields.next() {
            Some(s) if !s.is_empty() => Some(resolve_index(s, self.uvs.len(), line)?),
            _ => None,
        };
        let normal = match fields.next() {
            Some(s) if !s.is_empty() => Some(resolve_index(s, self.normals.len(), line)?),
            _ => None,
        };
        Ok(Corner {
            position,
            uv,
            normal,
        })
    }

    fn push_triangle(&mut self, tri: [Corner; 3]) {
        let p = tri.map(|c| Vec3::from(self.positions[c.position]));
        let face_normal = (p[1] - p[0]).cross(p[2] - p[0]).normalize_or_zero();
        let smooth = tri.iter().all(|c| c.normal.is_some());

        let vertices: Vec<MeshVertex> = tri
            .iter()
            .zip(p)
            .map(|(c, pos)| MeshVertex {
                position: pos.to_array(),
                normal: match c.normal {
                    Some(n) if smooth => self.normals[n],
                    _ => face_normal.to_array(),
                },
                uv: c.uv.map(|i| self.uvs[i]).unwrap_or([0.0, 0.0]),
            })
            .collect();

        let material = self.current_material.clone();
        let object = self.current_object();
        match object.parts.last_mut() {
            Some(part) => part.vertices.extend(vertices),
            None => object.parts.push(ObjPart { material, vertices }),
        }
    }

    fn finish(mut self) -> ObjModel {
        for object in &mut self.objects {
            object.parts.retain(|p| !p.vertices.is_empty());
        }
        self.objects.retain(|o| !o.parts.is_empty());

        ObjModel {
            objects: self.objects,
            material_libs: self.material_libs,
        }
    }
}

/// Parse a Wavefront OBJ source into triangulated, material-split parts.
///
/// Polygons are fan-triangulated. Objects (`o`) and groups (`g`) both open a
/// new object; `usemtl` opens a new part. Lines, points, and smoothing
/// groups are ignored.
pub fn parse_obj<R: Read>(reader: R) -> Result<ObjModel> {
    let mut b = Builder::default();

    for (i, line_result) in BufReader::new(reader).lines().enumerate() {
        let line_no = i + 1;
        let line = line_result?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        let keyword = parts.next().unwrap_or_default();

        match keyword {
            "v" => {
                let v = parse_floats(parts, 3, line_no, |l, r| DataError::obj(l, r))?;
                b.positions.push([v[0], v[1], v[2]]);
            }
            "vt" => {
                let v = parse_floats(parts, 1, line_no, |l, r| DataError::obj(l, r))?;
                b.uvs.push([v[0], v.get(1).copied().unwrap_or(0.0)]);
            }
            "vn" => {
                let v = parse_floats(parts, 3, line_no, |l, r| DataError::obj(l, r))?;
                b.normals.push([v[0], v[1], v[2]]);
            }
            "f" => {
                let corners = parts
                    .map(|t| b.corner(t, line_no))
                    .collect::<Result<Vec<_>>>()?;
                if corners.len() < 3 {
                    return Err(DataError::obj(
                        line_no,
                        format!("face needs 3 corners, found {}", corners.len()),
                    ));
                }
                for k in 1..corners.len() - 1 {
                    b.push_triangle([corners[0], corners[k], corners[k + 1]]);
                }
            }
            "o" | "g" => {
                let name = trimmed[keyword.len()..].trim();
                b.start_object(name);
            }
            "usemtl" => {
                let name = trimmed[keyword.len()..].trim();
                b.use_material(name);
            }
            "mtllib" => {
                b.material_libs.extend(parts.map(str::to_owned));
            }
            _ => {}
        }
    }

    Ok(b.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const QUAD: &str = "\
# unit quad
mtllib material.mtl
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
o plate
usemtl wood
f 1/1/1 2/2/1 3/3/1 4/4/1
";

    #[test]
    fn quad_is_fan_triangulated() {
        let model = parse_obj(QUAD.as_bytes()).unwrap();
        assert_eq!(model.material_libs, vec!["material.mtl".to_owned()]);
        assert_eq!(model.objects.len(), 1);

        let object = &model.objects[0];
        assert_eq!(object.name, "plate");
        assert_eq!(object.parts.len(), 1);

        let part = &object.parts[0];
        assert_eq!(part.material.as_deref(), Some("wood"));
        assert_eq!(part.vertices.len(), 6);
        assert_eq!(part.vertices[4].position, [1.0, 1.0, 0.0]);
        assert_eq!(part.vertices[5].uv, [0.0, 1.0]);
        assert_eq!(model.triangle_count(), 2);
    }

    #[test]
    fn negative_indices_are_relative() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n";
        let model = parse_obj(src.as_bytes()).unwrap();
        let part = &model.objects[0].parts[0];
        assert_eq!(part.vertices[1].position, [1.0, 0.0, 0.0]);
        assert!(part.material.is_none());
    }

    #[test]
    fn missing_normals_get_face_normal() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let model = parse_obj(src.as_bytes()).unwrap();
        let n = model.objects[0].parts[0].vertices[0].normal;
        assert_relative_eq!(n[2], 1.0);
    }

    #[test]
    fn material_switch_opens_new_part() {
        let src = "\
v 0 0 0
v 1 0 0
v 0 1 0
usemtl a
f 1 2 3
usemtl b
f 1 3 2
usemtl c
";
        let model = parse_obj(src.as_bytes()).unwrap();
        let parts = &model.objects[0].parts;
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].material.as_deref(), Some("a"));
        assert_eq!(parts[1].material.as_deref(), Some("b"));
    }

    #[test]
    fn out_of_range_index_reports_line() {
        let src = "v 0 0 0\nf 1 2 3\n";
        let err = parse_obj(src.as_bytes()).unwrap_err();
        assert!(matches!(err, DataError::Obj { line: 2, .. }));
    }

    #[test]
    fn bad_number_reports_line() {
        let err = parse_obj("v 0 zero 0\n".as_bytes()).unwrap_err();
        assert!(matches!(err, DataError::Obj { line: 1, .. }));
    }
}
