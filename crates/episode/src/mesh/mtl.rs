use super::obj::parse_floats;
use crate::error::{DataError, Result};
use std::io::{BufRead, BufReader, Read};

/// One `newmtl` block.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    pub shininess: f32,
    pub opacity: f32,
    /// Texture path from `map_Kd`, relative to the MTL until
    /// [`MaterialLibrary::resolve_maps`] runs.
    pub diffuse_map: Option<String>,
}

impl Material {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ambient: [0.0; 3],
            diffuse: [1.0; 3],
            specular: [0.0; 3],
            shininess: 0.0,
            opacity: 1.0,
            diffuse_map: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MaterialLibrary {
    materials: Vec<Material>,
}

impl MaterialLibrary {
    pub fn get(&self, name: &str) -> Option<&Material> {
        self.materials.iter().find(|m| m.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Material> {
        self.materials.iter()
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Adds materials from another library; later definitions replace
    /// earlier ones with the same name.
    pub fn merge(&mut self, other: MaterialLibrary) {
        for m in other.materials {
            match self.materials.iter_mut().find(|e| e.name == m.name) {
                Some(existing) => *existing = m,
                None => self.materials.push(m),
            }
        }
    }

    /// Distinct texture paths referenced by `map_Kd`.
    /// Rewrites every `map_Kd` against the directory of the MTL file at
    /// `mtl_path`, so texture paths no longer depend on where the library
    /// was found.
    pub fn resolve_maps(&mut self, mtl_path: &str) {
        for m in &mut self.materials {
            if let Some(map) = m.diffuse_map.as_mut() {
                *map = super::sibling_path(mtl_path, map);
            }
        }
    }

    pub fn texture_paths(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for path in self.materials.iter().filter_map(|m| m.diffuse_map.as_deref()) {
            if !out.contains(&path) {
                out.push(path);
            }
        }
        out
    }
}

/// Parse a Wavefront MTL source. Statements outside a `newmtl` block and
/// unknown statements are skipped.
pub fn parse_mtl<R: Read>(reader: R) -> Result<MaterialLibrary> {
    let mut materials: Vec<Material> = Vec::new();

    for (i, line_result) in BufReader::new(reader).lines().enumerate() {
        let line_no = i + 1;
        let line = line_result?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        let keyword = parts.next().unwrap_or_default();

        if keyword == "newmtl" {
            let name = trimmed[keyword.len()..].trim();
            if name.is_empty() {
                return Err(DataError::mtl(line_no, "newmtl without a name"));
            }
            materials.push(Material::named(name));
            continue;
        }

        let Some(current) = materials.last_mut() else {
            continue;
        };

        match keyword {
            "Ka" | "Kd" | "Ks" => {
                let v = parse_floats(parts, 3, line_no, |l, r| DataError::mtl(l, r))?;
                let rgb = [v[0], v[1], v[2]];
                match keyword {
                    "Ka" => current.ambient = rgb,
                    "Kd" => current.diffuse = rgb,
                    _ => current.specular = rgb,
                }
            }
            "Ns" => {
                current.shininess = parse_floats(parts, 1, line_no, |l, r| DataError::mtl(l, r))?[0];
            }
            "d" => {
                current.opacity = parse_floats(parts, 1, line_no, |l, r| DataError::mtl(l, r))?[0];
            }
            "Tr" => {
                current.opacity = 1.0 - parse_floats(parts, 1, line_no, |l, r| DataError::mtl(l, r))?[0];
            }
            "map_Kd" => {
                // Options such as `-s 1 1 1` precede the file name.
                match parts.last() {
                    Some(path) => current.diffuse_map = Some(path.to_owned()),
                    None => return Err(DataError::mtl(line_no, "map_Kd without a path")),
                }
            }
            _ => {}
        }
    }

    Ok(MaterialLibrary { materials })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRC: &str = "\
# exported
newmtl wood
Ka 0.1 0.1 0.1
Kd 0.6 0.4 0.2
Ns 32
map_Kd -s 1 1 1 textures/wood.png

newmtl glass
Kd 0.9 0.9 1.0
Tr 0.75
illum 4
";

    #[test]
    fn parses_blocks_and_maps() {
        let lib = parse_mtl(SRC.as_bytes()).unwrap();
        assert_eq!(lib.len(), 2);

        let wood = lib.get("wood").unwrap();
        assert_eq!(wood.diffuse, [0.6, 0.4, 0.2]);
        assert_eq!(wood.shininess, 32.0);
        assert_eq!(wood.diffuse_map.as_deref(), Some("textures/wood.png"));

        let glass = lib.get("glass").unwrap();
        assert_eq!(glass.opacity, 0.25);
        assert!(glass.diffuse_map.is_none());
        assert_eq!(lib.texture_paths(), vec!["textures/wood.png"]);
    }

    #[test]
    fn bad_number_reports_mtl_line() {
        let err = parse_mtl("newmtl a\nKd 1 x 0\n".as_bytes()).unwrap_err();
        assert!(matches!(err, DataError::Mtl { line: 2, .. }));
    }

    #[test]
    fn maps_follow_their_library() {
        let mut lib = parse_mtl(SRC.as_bytes()).unwrap();
        lib.resolve_maps("/assets/mat/shared.mtl");
        assert_eq!(lib.texture_paths(), vec!["/assets/mat/textures/wood.png"]);
        assert!(lib.get("glass").unwrap().diffuse_map.is_none());
    }

    #[test]
    fn merge_replaces_by_name() {
        let mut lib = parse_mtl(SRC.as_bytes()).unwrap();
        let other = parse_mtl("newmtl wood\nKd 1 0 0\n".as_bytes()).unwrap();
        lib.merge(other);
        assert_eq!(lib.len(), 2);
        assert_eq!(lib.get("wood").unwrap().diffuse, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn short_colour_is_an_error() {
        let err = parse_mtl("newmtl a\nKd 1 1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, DataError::Mtl { line: 2, .. }));
    }
}
