use crate::url::DOCUMENTDB_HOME_DIR;
use std::path::{Path, PathBuf};

/// The folders in which relative file references (CA file, SSH private key file) are searched.
///
/// The order is significant: the user's home directory, the `.documentdb` folder below it,
/// and the folder of the running executable. Compute the value once at application start,
/// with [`SearchPaths::from_environment`], and pass it down.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchPaths {
    home: Option<PathBuf>,
    folders: Vec<PathBuf>,
}

impl SearchPaths {
    /// Creates search paths from explicit values.
    ///
    /// `home` is substituted for a leading `~/`; `folders` are searched in the given order,
    /// `None` entries are skipped.
    pub fn new<I>(home: Option<PathBuf>, folders: I) -> Self
    where
        I: IntoIterator<Item = Option<PathBuf>>,
    {
        Self {
            home,
            folders: folders.into_iter().flatten().collect(),
        }
    }

    /// Determines the standard search paths of the current process.
    pub fn from_environment() -> Self {
        let home = dirs::home_dir();
        let documentdb_home = home.as_ref().map(|h| h.join(DOCUMENTDB_HOME_DIR));
        let exe_folder = match std::env::current_exe() {
            Ok(exe) => exe.parent().map(Path::to_path_buf),
            Err(e) => {
                warn!("location of the running executable is unknown: {e}");
                None
            }
        };
        trace!("search paths: home {home:?}, {documentdb_home:?}, {exe_folder:?}");
        Self::new(home.clone(), [home, documentdb_home, exe_folder])
    }

    /// The user's home directory.
    pub fn home(&self) -> Option<&Path> {
        self.home.as_deref()
    }

    /// The search folders, in search order.
    pub fn folders(&self) -> &[PathBuf] {
        &self.folders
    }

    /// Resolves a user-supplied file reference.
    ///
    /// - `~/x` (or `~\x`) resolves to `x` below the home directory, without searching
    /// - absolute paths are returned unchanged
    /// - relative paths resolve to the first search folder in which they exist, or,
    ///   if they exist in none, to the current working directory
    pub fn resolve<P: AsRef<str>>(&self, path: P) -> PathBuf {
        resolve_path(path.as_ref(), self.home(), &self.folders)
    }
}

pub(crate) fn resolve_path(path: &str, home: Option<&Path>, folders: &[PathBuf]) -> PathBuf {
    if let (Some(rest), Some(home)) = (strip_home_prefix(path), home) {
        return absolute(&home.join(rest));
    }

    let file_path = Path::new(path);
    if file_path.is_absolute() {
        return file_path.to_path_buf();
    }

    for folder in folders {
        let candidate = folder.join(file_path);
        if absolute(&candidate).exists() {
            trace!("found {path} in {}", folder.display());
            return candidate;
        }
    }
    absolute(file_path)
}

fn strip_home_prefix(path: &str) -> Option<&str> {
    path.strip_prefix("~/")
        .or_else(|| path.strip_prefix("~\\"))
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    }
}
