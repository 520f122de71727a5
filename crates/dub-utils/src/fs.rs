use std::{fs, path::Path};

use crate::error::{FileSystemError, FileSystemResult, IoOperation, IoResultExt};

/// Removes the file or directory at `path`. A nonexistent path is not an
/// error, matching the idempotent deletes the package cache relies on when
/// cleaning up a failed extraction.
pub fn safe_remove<P: AsRef<Path>>(path: P) -> FileSystemResult<()> {
    let path = path.as_ref();

    if !path.exists() {
        return Ok(());
    }

    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    result.with_path(path, IoOperation::Remove)
}

/// Creates a directory (and its parents) if it doesn't already exist.
pub fn ensure_dir_exists<P: AsRef<Path>>(path: P) -> FileSystemResult<()> {
    let path = path.as_ref();
    if !path.exists() {
        fs::create_dir_all(path).with_path(path, IoOperation::CreateDirectory)?;
    } else if !path.is_dir() {
        return Err(FileSystemError::NotADirectory {
            path: path.to_path_buf(),
        });
    }

    Ok(())
}

/// Recursively walks a directory, invoking `action` on every regular file
/// found. Used to enumerate cached package archives and extracted trees.
pub fn walk_dir<P, F, E>(dir: P, action: &mut F) -> Result<(), E>
where
    P: AsRef<Path>,
    F: FnMut(&Path) -> Result<(), E>,
    FileSystemError: Into<E>,
{
    let dir = dir.as_ref();

    if !dir.is_dir() {
        return Err(FileSystemError::NotADirectory {
            path: dir.to_path_buf(),
        }
        .into());
    }

    for entry in fs::read_dir(dir)
        .with_path(dir, IoOperation::ReadDirectory)
        .map_err(Into::into)?
    {
        let Ok(entry) = entry else {
            continue;
        };
        let path = entry.path();

        if path.is_dir() {
            walk_dir(&path, action)?;
            continue;
        }

        action(&path)?;
    }

    Ok(())
}

/// Total size in bytes of a directory and everything beneath it. Skips
/// entries whose metadata cannot be read rather than failing outright.
pub fn dir_size<P: AsRef<Path>>(path: P) -> FileSystemResult<u64> {
    let path = path.as_ref();
    let mut total = 0;

    for entry in fs::read_dir(path).with_path(path, IoOperation::ReadDirectory)? {
        let Ok(entry) = entry else {
            continue;
        };
        let Ok(metadata) = entry.metadata() else {
            continue;
        };

        if metadata.is_file() {
            total += metadata.len();
        } else if metadata.is_dir() {
            total += dir_size(entry.path())?;
        }
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn removes_file_and_directory() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("f");
        fs::write(&file, "x").unwrap();
        safe_remove(&file).unwrap();
        assert!(!file.exists());

        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        safe_remove(&sub).unwrap();
        assert!(!sub.exists());
    }

    #[test]
    fn removing_nonexistent_path_is_ok() {
        let dir = tempdir().unwrap();
        safe_remove(dir.path().join("missing")).unwrap();
    }

    #[test]
    fn ensures_dir_exists_creates_parents() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a/b/c");
        ensure_dir_exists(&nested).unwrap();
        assert!(nested.is_dir());
        ensure_dir_exists(&nested).unwrap();
    }

    #[test]
    fn ensure_dir_exists_rejects_file_collision() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("f");
        fs::write(&file, "x").unwrap();
        assert!(ensure_dir_exists(&file).is_err());
    }

    #[test]
    fn walks_nested_directories() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        let f1 = dir.path().join("top");
        let f2 = sub.join("nested");
        fs::write(&f1, "a").unwrap();
        fs::write(&f2, "b").unwrap();

        let mut found = Vec::new();
        walk_dir(dir.path(), &mut |p| -> FileSystemResult<()> {
            found.push(p.to_path_buf());
            Ok(())
        })
        .unwrap();

        found.sort();
        let mut expected = vec![f1, f2];
        expected.sort();
        assert_eq!(found, expected);
    }

    #[test]
    fn computes_directory_size() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a"), b"12345").unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("b"), b"12345").unwrap();

        assert_eq!(dir_size(dir.path()).unwrap(), 10);
    }
}
