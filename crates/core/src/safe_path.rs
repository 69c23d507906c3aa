use std::env;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SafePathError {
    #[error("path '{}' escapes its root '{}'", path.display(), boundary.display())]
    OutOfBounds { path: PathBuf, boundary: PathBuf },
    #[error("unable to resolve '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A path that is guaranteed to stay inside the directory it was rooted at.
///
/// The boundary is resolved once, when the root is created, and is carried
/// unchanged into every path derived through [`SafePath::join`]:
///
/// ```no_run
/// # use unmap_core::SafePath;
/// let root = SafePath::new("output/app/files")?;    // boundary: <abs>/output/app/files
/// let dir = root.join("static/js")?;                // boundary unchanged
/// assert!(dir.join("../../../../etc/passwd").is_err());
/// # Ok::<(), unmap_core::SafePathError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafePath {
    path: PathBuf,
    resolved: PathBuf,
    boundary: PathBuf,
}

impl SafePath {
    /// Root a new safe path at `root`. The root does not need to exist.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, SafePathError> {
        let path = root.as_ref().to_path_buf();
        let boundary = resolve(&path)?;
        Ok(Self {
            path,
            resolved: boundary.clone(),
            boundary,
        })
    }

    /// Join `part` onto this path, failing if the resolved result leaves the
    /// original boundary. An absolute `part` replaces the path entirely and is
    /// therefore rejected unless it points back inside the boundary.
    pub fn join(&self, part: impl AsRef<Path>) -> Result<Self, SafePathError> {
        let path = self.path.join(part.as_ref());
        let resolved = resolve(&path)?;
        if !resolved.starts_with(&self.boundary) {
            return Err(SafePathError::OutOfBounds {
                path: resolved,
                boundary: self.boundary.clone(),
            });
        }
        Ok(Self {
            path,
            resolved,
            boundary: self.boundary.clone(),
        })
    }

    /// The composed, non-canonicalized path to use for filesystem operations.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Absolute, normalized form of [`SafePath::path`].
    pub fn resolved(&self) -> &Path {
        &self.resolved
    }

    /// `true` when this path resolves to the boundary directory itself.
    pub fn is_boundary(&self) -> bool {
        self.resolved == self.boundary
    }

    /// The resolved root every join is checked against.
    pub fn boundary(&self) -> &Path {
        &self.boundary
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.path
    }
}

impl AsRef<Path> for SafePath {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

/// One-shot helper: root at `root`, join `part`, return the composed path.
pub fn safe_path_join(root: impl AsRef<Path>, part: impl AsRef<Path>) -> Result<PathBuf, SafePathError> {
    Ok(SafePath::new(root)?.join(part)?.into_path_buf())
}

/// Make `path` absolute and normalize it without requiring it to exist.
///
/// `.` is dropped, `..` pops the previous component and every existing symlink
/// along the way is replaced by its canonical target, so a link pointing out of
/// the tree cannot hide an escape.
fn resolve(path: &Path) -> Result<PathBuf, SafePathError> {
    let io_err = |source| SafePathError::Io {
        path: path.to_path_buf(),
        source,
    };

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir().map_err(io_err)?.join(path)
    };

    let mut resolved = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => resolved.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            Component::Normal(part) => {
                resolved.push(part);
                let is_link = fs::symlink_metadata(&resolved)
                    .map(|meta| meta.file_type().is_symlink())
                    .unwrap_or(false);
                if is_link {
                    resolved = fs::canonicalize(&resolved).map_err(io_err)?;
                }
            }
        }
    }
    Ok(resolved)
}
