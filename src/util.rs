use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use anyhow::{bail, Context, Result};
use walkdir::WalkDir;
use zip::ZipArchive;

/// Permission bits applied to the installed binary.
pub const EXECUTABLE_MODE: u32 = 0o755;

/// Checks that a tool name can be embedded in URLs and cache paths.
pub fn validate_tool_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("Tool name must not be empty");
    }
    if name == "." || name == ".." {
        bail!("Invalid tool name: {}", name);
    }
    if name.chars().any(|c| c == '/' || c == '\\' || c.is_whitespace()) {
        bail!("Invalid tool name: {:?}", name);
    }
    Ok(())
}

/// Escapes a message for a GitHub Actions workflow command (`::error::...`).
pub fn escape_workflow_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Extracts a zip archive into `dest_dir` and returns the extracted file paths.
///
/// Entries whose names would escape `dest_dir` are skipped. Unix modes
/// stored in the archive are restored.
///
/// # Errors
///
/// Returns an error if the archive cannot be opened or read, or a file
/// cannot be written.
pub fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<Vec<PathBuf>> {
    let file = File::open(archive_path)
        .with_context(|| format!("Could not open archive {:?}", archive_path))?;
    let mut archive = ZipArchive::new(file)
        .with_context(|| format!("Could not read zip archive {:?}", archive_path))?;

    fs::create_dir_all(dest_dir)?;
    let mut extracted = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let relative_path = match entry.enclosed_name() {
            Some(path) => path,
            None => continue,
        };
        let out_path = dest_dir.join(&relative_path);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out_file = File::create(&out_path)
            .with_context(|| format!("Could not create {:?}", out_path))?;
        io::copy(&mut entry, &mut out_file)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                fs::set_permissions(&out_path, fs::Permissions::from_mode(mode & 0o7777))?;
            }
        }
        extracted.push(out_path);
    }
    Ok(extracted)
}

/// Sets [`EXECUTABLE_MODE`] on `path`.
#[cfg(unix)]
pub fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)
        .with_context(|| format!("Could not read metadata of {:?}", path))?
        .permissions();
    perms.set_mode(EXECUTABLE_MODE);
    fs::set_permissions(path, perms)
        .with_context(|| format!("Could not make {:?} executable", path))?;
    Ok(())
}

/// Windows has no mode bits; the file only has to exist.
#[cfg(not(unix))]
pub fn make_executable(path: &Path) -> Result<()> {
    if !path.is_file() {
        bail!("{:?} does not exist", path);
    }
    Ok(())
}

/// Checks if a given path is an executable file on Unix.
#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
pub fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Recursively copies the contents of `src` into `dest`.
///
/// File permissions are carried over; symlinks are recreated on Unix.
pub fn copy_dir_all(src: &Path, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest)?;
    for entry in WalkDir::new(src).min_depth(1).follow_links(false) {
        let entry = entry?;
        let relative = entry.path().strip_prefix(src)?;
        let target = dest.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        }
        else if file_type.is_symlink() {
            #[cfg(unix)]
            {
                let link = fs::read_link(entry.path())?;
                std::os::unix::fs::symlink(link, &target)?;
            }
            #[cfg(not(unix))]
            {
                fs::copy(entry.path(), &target)?;
            }
        }
        else {
            fs::copy(entry.path(), &target)
                .with_context(|| format!("Could not copy {:?} to {:?}", entry.path(), target))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &str, u32)]) {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content, mode) in entries {
            let options = SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Stored)
                .unix_permissions(*mode);
            writer.start_file(*name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        let cursor = writer.finish().unwrap();
        fs::write(path, cursor.into_inner()).unwrap();
    }

    #[test]
    fn test_validate_tool_name() {
        assert!(validate_tool_name("terraform").is_ok());
        assert!(validate_tool_name("consul-template").is_ok());
        assert!(validate_tool_name("").is_err());
        assert!(validate_tool_name("..").is_err());
        assert!(validate_tool_name("../etc").is_err());
        assert!(validate_tool_name("terra form").is_err());
    }

    #[test]
    fn test_escape_workflow_data() {
        assert_eq!(escape_workflow_data("plain"), "plain");
        assert_eq!(escape_workflow_data("100% done\nnext\r"), "100%25 done%0Anext%0D");
    }

    #[test]
    fn test_extract_zip() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("tool.zip");
        write_zip(&archive, &[("tool", "#!/bin/sh\n", 0o644), ("docs/README", "readme", 0o644)]);

        let dest = dir.path().join("out");
        let files = extract_zip(&archive, &dest).unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(fs::read_to_string(dest.join("tool")).unwrap(), "#!/bin/sh\n");
        assert_eq!(fs::read_to_string(dest.join("docs").join("README")).unwrap(), "readme");
    }

    #[test]
    fn test_extract_not_a_zip() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("tool.zip");
        fs::write(&archive, "<html>not found</html>").unwrap();
        assert!(extract_zip(&archive, &dir.path().join("out")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_make_executable() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().unwrap();
        let path = dir.path().join("tool");
        fs::write(&path, "x").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).unwrap();
        assert!(!is_executable(&path));

        make_executable(&path).unwrap();
        assert!(is_executable(&path));
        assert_eq!(fs::metadata(&path).unwrap().permissions().mode() & 0o777, 0o755);
    }

    #[test]
    fn test_make_executable_missing_file() {
        let dir = tempdir().unwrap();
        assert!(make_executable(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_copy_dir_all() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("nested").join("deeper")).unwrap();
        fs::write(src.join("a"), "a").unwrap();
        fs::write(src.join("nested").join("deeper").join("b"), "b").unwrap();

        let dest = dir.path().join("dest");
        copy_dir_all(&src, &dest).unwrap();
        assert_eq!(fs::read_to_string(dest.join("a")).unwrap(), "a");
        assert_eq!(fs::read_to_string(dest.join("nested").join("deeper").join("b")).unwrap(), "b");
    }
}
