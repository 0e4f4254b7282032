//! Small filesystem helpers shared by the writers and the file discovery.

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::{Error, Result};

/// Fail with [`Error::OutputExists`] if `path` is an existing file and
/// `clobber` is not set.
pub fn check_clobber(path: &Path, clobber: bool) -> Result<()> {
    if path.is_file() && !clobber {
        return Err(Error::OutputExists(path.to_path_buf()));
    }
    Ok(())
}

/// Create `dir` (and parents) if missing and return its absolute path.
pub fn get_or_create_dir(dir: &Path) -> Result<PathBuf> {
    if !dir.is_dir() {
        fs::create_dir_all(dir)?;
        info!("+ {}", dir.display());
    }
    Ok(fs::canonicalize(dir)?)
}

/// Move the file name of `path` into `dir`.
pub fn replace_dir(path: &Path, dir: &Path) -> PathBuf {
    match path.file_name() {
        Some(name) => dir.join(name),
        None => dir.to_path_buf(),
    }
}

/// A chunk of a natural sort key: digit runs compare numerically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPart {
    Text(String),
    Number(u128),
}

impl PartialOrd for KeyPart {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for KeyPart {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (KeyPart::Number(a), KeyPart::Number(b)) => a.cmp(b),
            (KeyPart::Text(a), KeyPart::Text(b)) => a.cmp(b),
            (KeyPart::Number(_), KeyPart::Text(_)) => Ordering::Less,
            (KeyPart::Text(_), KeyPart::Number(_)) => Ordering::Greater,
        }
    }
}

/// Split `s` into text and number chunks, `"z23a"` -> `[z, 23, a]`.
pub fn natural_key(s: &str) -> Vec<KeyPart> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_digits = false;
    for ch in s.chars() {
        let is_digit = ch.is_ascii_digit();
        if is_digit != in_digits && !current.is_empty() {
            parts.push(make_part(std::mem::take(&mut current), in_digits));
        }
        in_digits = is_digit;
        current.push(ch);
    }
    if !current.is_empty() {
        parts.push(make_part(current, in_digits));
    }
    parts
}

fn make_part(chunk: String, digits: bool) -> KeyPart {
    if digits {
        if let Ok(n) = chunk.parse() {
            return KeyPart::Number(n);
        }
    }
    KeyPart::Text(chunk)
}

/// Sort paths so that embedded numbers order numerically.
pub fn natural_sort(paths: &mut [PathBuf]) {
    paths.sort_by_cached_key(|p| natural_key(&p.to_string_lossy()));
}

/// Files in `dir` whose names start with `prefix` and end with `suffix`,
/// naturally sorted. A missing directory yields an empty list.
pub fn list_matching(dir: &Path, prefix: &str, suffix: &str) -> Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut found = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(prefix) && name.ends_with(suffix) && entry.path().is_file() {
            found.push(entry.path());
        }
    }
    natural_sort(&mut found);
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn natural_key_splits_numbers() {
        assert_eq!(
            natural_key("z23a"),
            vec![
                KeyPart::Text("z".into()),
                KeyPart::Number(23),
                KeyPart::Text("a".into())
            ]
        );
    }

    #[test]
    fn natural_sort_orders_numbers_numerically() {
        let mut paths: Vec<PathBuf> = ["img10.fits", "img2.fits", "img1.fits"]
            .iter()
            .map(PathBuf::from)
            .collect();
        natural_sort(&mut paths);
        assert_eq!(
            paths,
            vec![
                PathBuf::from("img1.fits"),
                PathBuf::from("img2.fits"),
                PathBuf::from("img10.fits")
            ]
        );
    }

    #[test]
    fn replace_dir_keeps_file_name() {
        assert_eq!(
            replace_dir(Path::new("/data/a/SPITZER_I1_0001_cbcd.fits"), Path::new("/out")),
            PathBuf::from("/out/SPITZER_I1_0001_cbcd.fits")
        );
    }

    #[test]
    fn clobber_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.conf");
        check_clobber(&path, false).unwrap();
        fs::write(&path, "x").unwrap();
        assert!(matches!(
            check_clobber(&path, false),
            Err(Error::OutputExists(_))
        ));
        check_clobber(&path, true).unwrap();
    }

    #[test]
    fn creates_nested_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let abs = get_or_create_dir(&nested).unwrap();
        assert!(abs.is_dir());
        assert!(abs.is_absolute());
        get_or_create_dir(&nested).unwrap();
    }

    #[test]
    fn list_matching_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["S10_bcd.fits", "S9_bcd.fits", "S9_bunc.fits", "X1_bcd.fits"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        let found = list_matching(dir.path(), "S", "_bcd.fits").unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["S9_bcd.fits", "S10_bcd.fits"]);
    }

    #[test]
    fn list_matching_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_matching(&dir.path().join("nope"), "S", ".fits")
            .unwrap()
            .is_empty());
    }
}
