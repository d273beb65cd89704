//! Read the project `.env` into a key-value map. Nothing is applied to the process
//! environment here; `load_and_apply` decides precedence.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::LoadError;

/// `.env` in `override_dir` if given, else in the current directory; `None` if absent.
fn dotenv_path(override_dir: Option<&Path>) -> Option<PathBuf> {
    let dir = override_dir
        .map(Path::to_path_buf)
        .or_else(|| std::env::current_dir().ok())?;
    let path = dir.join(".env");
    path.is_file().then_some(path)
}

/// Parses `.env` with the `dotenv` crate. A missing file yields an empty map.
pub fn load_env_map(override_dir: Option<&Path>) -> Result<HashMap<String, String>, LoadError> {
    let Some(path) = dotenv_path(override_dir) else {
        return Ok(HashMap::new());
    };
    let iter = dotenv::from_path_iter(&path)
        .map_err(|e| LoadError::Dotenv(format!("{}: {}", path.display(), e)))?;
    let mut out = HashMap::new();
    for item in iter {
        let (key, value) =
            item.map_err(|e| LoadError::Dotenv(format!("{}: {}", path.display(), e)))?;
        out.insert(key, value);
    }
    Ok(out)
}
