//! Image and mesh collaborators: turn scene resources into document-relative paths.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use base64::Engine;

use crate::{
    diagnostics::Diagnostics,
    dsl::{ExportSettings, ImageDSL, ImageSource, MeshDSL},
    error::ExportError,
};

/// Resolves an image to the path written into `texture filename=".."`.
pub trait ImageStore {
    fn resolve(&self, image: &ImageDSL, diag: &mut Diagnostics) -> Result<String, ExportError>;
}

/// Resolves a mesh to one relative path per material slot.
pub trait MeshStore {
    fn parts(&self, mesh: &MeshDSL) -> Vec<String>;
}

fn to_document_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    match path.strip_prefix("//") {
        Some(rest) => rest.to_string(),
        None => path,
    }
}

/// `path` expressed relative to `base`, climbing with `..` where needed. Both are
/// made absolute lexically first; `None` when they share no root (another drive).
fn relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    let path = std::path::absolute(path).ok()?;
    let base = std::path::absolute(base).ok()?;
    let mut path_parts = path.components().filter(|c| *c != Component::CurDir).peekable();
    let mut base_parts = base.components().filter(|c| *c != Component::CurDir).peekable();
    if path_parts.peek() != base_parts.peek() {
        return None;
    }
    while let (Some(a), Some(b)) = (path_parts.peek(), base_parts.peek()) {
        if a != b {
            break;
        }
        path_parts.next();
        base_parts.next();
    }
    let mut rel: PathBuf = base_parts.map(|_| Component::ParentDir).collect();
    rel.extend(path_parts);
    Some(rel)
}

/// Final component of a document-supplied file name, so writes stay inside the
/// texture directory.
fn leaf_file_name(file_name: &str) -> Option<String> {
    let leaf = Path::new(file_name.trim()).file_name()?.to_string_lossy().into_owned();
    (!leaf.is_empty()).then_some(leaf)
}

/// Writes textures next to the exported document.
#[derive(Debug, Clone)]
pub struct FsImageStore {
    root: PathBuf,
    tex_dir: String,
    copy_images: bool,
    overwrite: bool,
}

impl FsImageStore {
    pub fn new(root: impl Into<PathBuf>, settings: &ExportSettings) -> Self {
        Self {
            root: root.into(),
            tex_dir: settings.tex_dir_name.clone(),
            copy_images: settings.copy_images,
            overwrite: settings.overwrite_existing_textures,
        }
    }

    /// Relative path under the texture directory; the file is (re)written unless
    /// it exists and overwriting is off.
    fn write_texture(&self, file_name: &str, write: impl FnOnce(&Path) -> Result<()>) -> Result<String> {
        if leaf_file_name(file_name).as_deref() != Some(file_name) {
            return Err(anyhow!("texture file name '{file_name}' is not a plain file name"));
        }
        let rel = format!("{}/{}", self.tex_dir, file_name);
        let abs = self.root.join(&self.tex_dir).join(file_name);
        if abs.exists() && !self.overwrite {
            return Ok(rel);
        }
        let dir = self.root.join(&self.tex_dir);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create texture directory {}", dir.display()))?;
        write(&abs)?;
        Ok(rel)
    }

    fn resolve_file(&self, image: &ImageDSL, path: &str, diag: &mut Diagnostics) -> Result<String> {
        let source_path = Path::new(path);
        let rel = match source_path.strip_prefix(&self.root) {
            Ok(inside) => inside.to_string_lossy().into_owned(),
            // Absolute paths on another drive have no relative form and stay as they are.
            Err(_) if source_path.is_absolute() => relative_to(source_path, &self.root)
                .map_or_else(|| path.to_string(), |rel| rel.to_string_lossy().into_owned()),
            Err(_) => path.to_string(),
        };
        let rel = to_document_path(&rel);
        if !self.copy_images && !rel.is_empty() {
            return Ok(rel);
        }

        diag.debug(format!("Copying image {rel}"));
        let source = if Path::new(&rel).is_absolute() {
            PathBuf::from(&rel)
        } else {
            self.root.join(&rel)
        };
        let file_name = match Path::new(&rel).file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => format!("{}.png", image.name),
        };
        self.write_texture(&file_name, |dest| {
            if dest == source {
                return Ok(());
            }
            std::fs::copy(&source, dest)
                .with_context(|| format!("failed to copy {} to {}", source.display(), dest.display()))?;
            Ok(())
        })
    }

    fn resolve_embedded(&self, image: &ImageDSL, file_name: &str, data: &str) -> Result<String> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(data.trim())
            .with_context(|| format!("image '{}' has invalid base64 data", image.name))?;
        let format = image::guess_format(&bytes)
            .with_context(|| format!("image '{}' is not in a recognized format", image.name))?;
        let file_name = if file_name.trim().is_empty() {
            let ext = format.extensions_str().first().copied().unwrap_or("png");
            format!("{}.{ext}", image.name)
        } else {
            leaf_file_name(file_name)
                .ok_or_else(|| anyhow!("image '{}' has no usable file name '{file_name}'", image.name))?
        };
        self.write_texture(&file_name, |dest| {
            std::fs::write(dest, &bytes).with_context(|| format!("failed to write {}", dest.display()))
        })
    }
}

impl ImageStore for FsImageStore {
    fn resolve(&self, image: &ImageDSL, diag: &mut Diagnostics) -> Result<String, ExportError> {
        let resolved = match &image.source {
            ImageSource::File { path } => self.resolve_file(image, path, diag),
            ImageSource::Embedded {
                file_name,
                data_base64,
            } => self.resolve_embedded(image, file_name, data_base64),
            ImageSource::Generated => Err(anyhow!("image '{}' is generated and has no pixel data", image.name)),
        };
        resolved.map_err(|e| ExportError::ImageExportFailure(format!("{e:#}")))
    }
}

/// Mesh parts already written by the host, one file per material slot.
#[derive(Debug, Clone)]
pub struct PreSplitMeshStore {
    mesh_dir: String,
}

impl PreSplitMeshStore {
    pub fn new(settings: &ExportSettings) -> Self {
        Self {
            mesh_dir: settings.mesh_dir_name.clone(),
        }
    }
}

impl MeshStore for PreSplitMeshStore {
    fn parts(&self, mesh: &MeshDSL) -> Vec<String> {
        mesh.parts
            .iter()
            .filter(|p| !p.trim().is_empty())
            .map(|p| to_document_path(&format!("{}/{}", self.mesh_dir, p)))
            .collect()
    }
}
