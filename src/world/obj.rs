//! Wavefront OBJ / MTL loading
//!
//! Produces a [`Mesh`] with one material per `usemtl` statement, in source
//! order. Missing material libraries and textures are logged and skipped;
//! only an unreadable model file or malformed statement is an error.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use crate::rasterizer::{Face, FaceVertex, Mesh, TexInfo, Texture, Vec3};

/// Error type for model loading
#[derive(Debug)]
pub enum ObjError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { line: usize, message: String },
    Texture(String),
}

impl std::fmt::Display for ObjError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjError::Io { path, source } => write!(f, "IO error reading {}: {}", path.display(), source),
            ObjError::Parse { line, message } => write!(f, "Parse error on line {}: {}", line, message),
            ObjError::Texture(msg) => write!(f, "Texture error: {}", msg),
        }
    }
}

impl std::error::Error for ObjError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ObjError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

fn parse_error(line: usize, message: impl Into<String>) -> ObjError {
    ObjError::Parse { line, message: message.into() }
}

fn read_file(path: &Path) -> Result<String, ObjError> {
    fs::read_to_string(path).map_err(|source| ObjError::Io { path: path.to_path_buf(), source })
}

/// Load an OBJ file; `mtllib` and texture paths resolve next to it
pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<Mesh, ObjError> {
    let path = path.as_ref();
    let source = read_file(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mesh = parse_obj(&source, base_dir)?;
    log::info!(
        "loaded {}: {} vertices, {} faces, {} materials",
        path.display(),
        mesh.vertices.len(),
        mesh.faces.len(),
        mesh.materials.len()
    );
    Ok(mesh)
}

fn parse_floats<'a>(
    parts: impl Iterator<Item = &'a str>,
    line: usize,
) -> Result<Vec<f32>, ObjError> {
    parts
        .map(|s| s.parse::<f32>().map_err(|e| parse_error(line, format!("bad number '{}': {}", s, e))))
        .collect()
}

fn vec3_from(values: &[f32], line: usize, what: &str) -> Result<Vec3, ObjError> {
    match values {
        [x, y, z, ..] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(parse_error(line, format!("{} needs 3 components", what))),
    }
}

/// Resolve a 1-based or negative (relative) OBJ index against `count` items
fn resolve_index(token: &str, count: usize, line: usize) -> Result<usize, ObjError> {
    let i: i64 = token
        .parse()
        .map_err(|_| parse_error(line, format!("bad index '{}'", token)))?;
    match i {
        0 => Err(parse_error(line, "index 0 is not valid")),
        i if i > 0 => Ok((i - 1) as usize),
        i => {
            let back = i.unsigned_abs() as usize;
            count
                .checked_sub(back)
                .ok_or_else(|| parse_error(line, format!("relative index {} out of range", i)))
        }
    }
}

/// Parse one `v`, `v/t`, `v//n` or `v/t/n` corner
fn parse_corner(token: &str, mesh: &Mesh, line: usize) -> Result<FaceVertex, ObjError> {
    let mut fields = token.split('/');
    let vertex = match fields.next() {
        Some(v) if !v.is_empty() => resolve_index(v, mesh.vertices.len(), line)?,
        _ => return Err(parse_error(line, format!("missing vertex index in '{}'", token))),
    };
    let texcoord = match fields.next() {
        Some(t) if !t.is_empty() => Some(resolve_index(t, mesh.texcoords.len(), line)?),
        _ => None,
    };
    let normal = match fields.next() {
        Some(n) if !n.is_empty() => Some(resolve_index(n, mesh.normals.len(), line)?),
        _ => None,
    };
    Ok(FaceVertex::new(vertex, normal, texcoord))
}

/// Parse OBJ text. `base_dir` is where `mtllib` files are looked up.
pub fn parse_obj(source: &str, base_dir: &Path) -> Result<Mesh, ObjError> {
    let mut mesh = Mesh::new();
    let mut library: HashMap<String, TexInfo> = HashMap::new();
    let mut current: Option<usize> = None;
    let mut has_colors = false;

    for (idx, raw) in source.lines().enumerate() {
        let line = idx + 1;
        let text = raw.split('#').next().unwrap_or("").trim();
        let mut parts = text.split_whitespace();
        let Some(keyword) = parts.next() else {
            continue;
        };

        match keyword {
            "v" => {
                let values = parse_floats(parts, line)?;
                let p = vec3_from(&values, line, "vertex")?;
                let color = if values.len() >= 6 {
                    has_colors = true;
                    Vec3::new(values[3], values[4], values[5])
                } else {
                    Vec3::ONE
                };
                mesh.add_vertex(p);
                mesh.colors.push(color);
            }
            "vn" => {
                let values = parse_floats(parts, line)?;
                mesh.add_normal(vec3_from(&values, line, "normal")?);
            }
            "vt" => {
                let values = parse_floats(parts, line)?;
                let get = |i: usize| values.get(i).copied().unwrap_or(0.0);
                if values.is_empty() {
                    return Err(parse_error(line, "texcoord needs at least 1 component"));
                }
                mesh.add_texcoord(Vec3::new(get(0), get(1), get(2)));
            }
            "f" => {
                let corners = parts
                    .map(|t| parse_corner(t, &mesh, line))
                    .collect::<Result<Vec<_>, _>>()?;
                if corners.len() < 3 {
                    log::warn!("line {}: face with {} corners skipped", line, corners.len());
                    continue;
                }
                let material = match current {
                    Some(m) => m,
                    None => {
                        let m = mesh.add_material(TexInfo::default());
                        current = Some(m);
                        m
                    }
                };
                mesh.add_face(Face::new(corners, material));
            }
            "usemtl" => {
                let name = parts.collect::<Vec<_>>().join(" ");
                let material = library.get(&name).cloned().unwrap_or_else(|| {
                    log::warn!("line {}: unknown material '{}', using default", line, name);
                    TexInfo { name: name.clone(), ..Default::default() }
                });
                current = Some(mesh.add_material(material));
            }
            "mtllib" => {
                for file in parts {
                    let path = base_dir.join(file);
                    match read_file(&path) {
                        Ok(text) => library.extend(parse_mtl(&text, base_dir)),
                        Err(e) => log::warn!("{}", e),
                    }
                }
            }
            _ => {}
        }
    }

    if !has_colors {
        mesh.colors.clear();
    }
    Ok(mesh)
}

fn load_texture(base_dir: &Path, file: &str) -> Result<Arc<Texture>, ObjError> {
    Texture::from_file(base_dir.join(file))
        .map(Arc::new)
        .map_err(ObjError::Texture)
}

/// Parse MTL text into materials keyed by name.
///
/// Texture statements take the last token as the file name, so map
/// options such as `-bm 0.5` are skipped.
pub fn parse_mtl(source: &str, base_dir: &Path) -> HashMap<String, TexInfo> {
    let mut materials = HashMap::new();
    let mut current: Option<TexInfo> = None;

    for raw in source.lines() {
        let text = raw.split('#').next().unwrap_or("").trim();
        let mut parts = text.split_whitespace();
        let Some(keyword) = parts.next() else {
            continue;
        };
        let args: Vec<&str> = parts.collect();

        if keyword == "newmtl" {
            if let Some(done) = current.take() {
                materials.insert(done.name.clone(), done);
            }
            current = Some(TexInfo { name: args.join(" "), ..Default::default() });
            continue;
        }
        let Some(mat) = current.as_mut() else {
            continue;
        };

        match keyword {
            "Kd" => {
                let values: Vec<f32> = args.iter().filter_map(|s| s.parse().ok()).collect();
                if let [r, g, b, ..] = values.as_slice() {
                    mat.color = Vec3::new(*r, *g, *b);
                }
            }
            "map_Kd" => mat.diffuse = map_texture(&args, base_dir, &mat.name),
            "map_Bump" | "map_bump" | "bump" | "norm" => mat.normal = map_texture(&args, base_dir, &mat.name),
            "map_Ks" => mat.bump = map_texture(&args, base_dir, &mat.name),
            "map_Ke" => mat.bloom = map_texture(&args, base_dir, &mat.name),
            _ => {}
        }
    }

    if let Some(done) = current {
        materials.insert(done.name.clone(), done);
    }
    materials
}

/// Texture named by the last argument; load failures are logged
fn map_texture(args: &[&str], base_dir: &Path, material: &str) -> Option<Arc<Texture>> {
    let file = args.last()?;
    load_texture(base_dir, file)
        .map_err(|e| log::warn!("material '{}': {}", material, e))
        .ok()
}
