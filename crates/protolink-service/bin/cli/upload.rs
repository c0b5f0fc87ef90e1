use protolink_core::{FileSet, UploadedFile};
use std::io;
use std::path::Path;
use tracing::trace;
use walkdir::WalkDir;

/// Reads every regular file below `root` into a file set, with paths
/// relative to `root` and `/` as separator. Symbolic links are followed, so
/// linked assets are uploaded like regular files.
pub async fn read_dir_as_file_set(root: &Path) -> io::Result<FileSet> {
    let root = root.to_path_buf();
    tokio::task::spawn_blocking(move || walk(&root))
        .await
        .map_err(io::Error::other)?
}

fn walk(root: &Path) -> io::Result<FileSet> {
    let mut files = FileSet::default();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry?;
        if entry.file_type().is_dir() {
            continue;
        }
        if !entry.file_type().is_file() {
            trace!(path = %entry.path().display(), "skipping non-regular file");
            continue;
        }

        let relative = relative_path(root, entry.path())?;
        let content = std::fs::read(entry.path())?;
        files.push(UploadedFile::new(relative, content));
    }

    Ok(files)
}

fn relative_path(root: &Path, path: &Path) -> io::Result<String> {
    let relative = path
        .strip_prefix(root)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    relative
        .components()
        .map(|component| {
            component.as_os_str().to_str().ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("{} is not valid UTF-8", path.display()),
                )
            })
        })
        .collect::<io::Result<Vec<_>>>()
        .map(|segments| segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_nested_files_with_forward_slashes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("css")).unwrap();
        std::fs::write(dir.path().join("index.html"), "<html/>").unwrap();
        std::fs::write(dir.path().join("css").join("site.css"), "body{}").unwrap();

        let files = read_dir_as_file_set(dir.path()).await.unwrap();

        let mut paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        paths.sort();
        assert_eq!(paths, ["css/site.css", "index.html"]);
        assert_eq!(files.total_bytes(), "<html/>".len() + "body{}".len());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn follows_symlinked_directories() {
        let dir = tempfile::tempdir().unwrap();
        let proto = dir.path().join("proto");
        let shared = dir.path().join("shared");
        std::fs::create_dir_all(&proto).unwrap();
        std::fs::create_dir_all(&shared).unwrap();
        std::fs::write(proto.join("index.html"), "<html/>").unwrap();
        std::fs::write(shared.join("logo.svg"), "<svg/>").unwrap();
        std::os::unix::fs::symlink(&shared, proto.join("assets")).unwrap();

        let files = read_dir_as_file_set(&proto).await.unwrap();

        let mut paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        paths.sort();
        assert_eq!(paths, ["assets/logo.svg", "index.html"]);
    }

    #[tokio::test]
    async fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();

        assert!(read_dir_as_file_set(&dir.path().join("nope")).await.is_err());
    }
}
