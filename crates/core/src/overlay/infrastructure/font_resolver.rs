use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::FONT_EXTENSIONS;

/// Environment variable naming a font file to use when none is given.
pub const FONT_ENV_VAR: &str = "MOVIEMAKER_FONT";

/// Fonts tried first, in order, when scanning system directories.
const PREFERRED_FONTS: &[&str] = &[
    "DejaVuSans-Bold.ttf",
    "DejaVuSans.ttf",
    "LiberationSans-Bold.ttf",
    "LiberationSans-Regular.ttf",
    "Arial Bold.ttf",
    "Arial.ttf",
    "arialbd.ttf",
    "arial.ttf",
];

/// How deep to descend into font directories (`/usr/share/fonts/truetype/dejavu`).
const MAX_SEARCH_DEPTH: usize = 3;

#[derive(Error, Debug)]
pub enum FontResolveError {
    #[error("font file not found: {0}")]
    Missing(PathBuf),
    #[error("failed to read font {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no usable font found; pass a font file or set {}", FONT_ENV_VAR)]
    NotFound,
}

/// Resolve the font file for the title label.
///
/// Resolution order:
/// 1. Explicit path (must exist)
/// 2. `MOVIEMAKER_FONT`
/// 3. Well-known fonts in the user and system font directories
/// 4. Any TrueType/OpenType file in those directories
pub fn resolve(explicit: Option<&Path>) -> Result<PathBuf, FontResolveError> {
    let from_env = std::env::var_os(FONT_ENV_VAR).map(PathBuf::from);
    resolve_from(explicit, from_env, &font_search_dirs())
}

pub fn load(path: &Path) -> Result<Vec<u8>, FontResolveError> {
    fs::read(path).map_err(|e| FontResolveError::Read {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Platform font directories, user directory first.
pub fn font_search_dirs() -> Vec<PathBuf> {
    let mut search: Vec<PathBuf> = dirs::font_dir().into_iter().collect();
    #[cfg(target_os = "macos")]
    search.extend(["/Library/Fonts", "/System/Library/Fonts"].map(PathBuf::from));
    #[cfg(target_os = "windows")]
    search.push(PathBuf::from(r"C:\Windows\Fonts"));
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    search.extend(["/usr/share/fonts", "/usr/local/share/fonts"].map(PathBuf::from));
    search
}

fn resolve_from(
    explicit: Option<&Path>,
    from_env: Option<PathBuf>,
    search_dirs: &[PathBuf],
) -> Result<PathBuf, FontResolveError> {
    if let Some(path) = explicit {
        return if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(FontResolveError::Missing(path.to_path_buf()))
        };
    }

    if let Some(path) = from_env {
        if path.is_file() {
            return Ok(path);
        }
        log::warn!("{FONT_ENV_VAR} points to missing file {}", path.display());
    }

    let candidates: Vec<PathBuf> = search_dirs
        .iter()
        .flat_map(|dir| font_files(dir, MAX_SEARCH_DEPTH))
        .collect();

    for preferred in PREFERRED_FONTS {
        if let Some(found) = candidates
            .iter()
            .find(|p| p.file_name().and_then(|n| n.to_str()) == Some(*preferred))
        {
            return Ok(found.clone());
        }
    }

    candidates
        .into_iter()
        .next()
        .ok_or(FontResolveError::NotFound)
}

/// Font files under `dir`, sorted for a stable pick.
fn font_files(dir: &Path, depth: usize) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut files = Vec::new();
    let mut subdirs = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            subdirs.push(path);
        } else if has_font_extension(&path) {
            files.push(path);
        }
    }
    files.sort();
    subdirs.sort();

    if depth > 0 {
        for sub in subdirs {
            files.extend(font_files(&sub, depth - 1));
        }
    }
    files
}

fn has_font_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| FONT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"font").unwrap();
    }

    #[test]
    fn test_explicit_path_wins() {
        let tmp = TempDir::new().unwrap();
        let explicit = tmp.path().join("mine.otf");
        touch(&explicit);
        touch(&tmp.path().join("sys/DejaVuSans.ttf"));

        let found =
            resolve_from(Some(&explicit), None, &[tmp.path().join("sys")]).unwrap();
        assert_eq!(found, explicit);
    }

    #[test]
    fn test_explicit_missing_is_an_error() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("DejaVuSans.ttf"));
        let missing = tmp.path().join("nope.ttf");

        let err = resolve_from(Some(&missing), None, &[tmp.path().to_path_buf()]).unwrap_err();
        assert!(matches!(err, FontResolveError::Missing(p) if p == missing));
    }

    #[test]
    fn test_env_path_used_before_search() {
        let tmp = TempDir::new().unwrap();
        let env_font = tmp.path().join("env.ttf");
        touch(&env_font);
        touch(&tmp.path().join("sys/DejaVuSans.ttf"));

        let found =
            resolve_from(None, Some(env_font.clone()), &[tmp.path().join("sys")]).unwrap();
        assert_eq!(found, env_font);
    }

    #[test]
    fn test_missing_env_path_falls_through() {
        let tmp = TempDir::new().unwrap();
        let system = tmp.path().join("sys/DejaVuSans.ttf");
        touch(&system);

        let found = resolve_from(
            None,
            Some(tmp.path().join("gone.ttf")),
            &[tmp.path().join("sys")],
        )
        .unwrap();
        assert_eq!(found, system);
    }

    #[test]
    fn test_preferred_font_beats_alphabetical_order() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("a/Aardvark.ttf"));
        let preferred = tmp.path().join("truetype/dejavu/DejaVuSans.ttf");
        touch(&preferred);

        let found = resolve_from(None, None, &[tmp.path().to_path_buf()]).unwrap();
        assert_eq!(found, preferred);
    }

    #[test]
    fn test_any_font_when_no_preferred_one() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("notes.txt"));
        let font = tmp.path().join("x/Some.OTF");
        touch(&font);

        let found = resolve_from(None, None, &[tmp.path().to_path_buf()]).unwrap();
        assert_eq!(found, font);
    }

    #[test]
    fn test_nothing_found() {
        let tmp = TempDir::new().unwrap();
        let err = resolve_from(None, None, &[tmp.path().join("empty")]).unwrap_err();
        assert!(matches!(err, FontResolveError::NotFound));
        assert!(err.to_string().contains(FONT_ENV_VAR));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load(Path::new("/nonexistent/font.ttf")).unwrap_err();
        assert!(matches!(err, FontResolveError::Read { .. }));
    }
}
