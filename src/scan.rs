use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// List the chapter files directly inside `dir`, sorted by file name.
///
/// A file counts as a chapter when its name contains `.m4a`. Returned paths
/// are absolute.
pub fn list_chapter_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let dir = dir
        .canonicalize()
        .with_context(|| format!("Failed to open folder {:?}", dir))?;

    let mut files: Vec<PathBuf> = WalkDir::new(&dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_chapter_file(e.path()))
        .map(|e| e.into_path())
        .collect();

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    Ok(files)
}

/// Check if a path names an m4a chapter file
fn is_chapter_file(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().contains(".m4a"))
        .unwrap_or(false)
}

/// Book string taken from the folder name, with double quotes removed
pub fn book_string_for(folder: &Path) -> String {
    folder
        .file_name()
        .map(|n| n.to_string_lossy().replace('"', ""))
        .unwrap_or_default()
}

/// `<parent>/<folder>_repack`, next to the source folder
pub fn default_output_dir(folder: &Path) -> PathBuf {
    let mut name = folder.file_name().unwrap_or_default().to_os_string();
    name.push("_repack");
    folder.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_is_chapter_file() {
        assert!(is_chapter_file(Path::new("/books/Dune/0001.m4a")));
        assert!(is_chapter_file(Path::new("/books/Dune/0001.m4a.part")));
        assert!(!is_chapter_file(Path::new("/books/Dune/cover.jpg")));
        assert!(!is_chapter_file(Path::new("/books/Dune/0001.M4B")));
    }

    #[test]
    fn test_list_chapter_files_sorted_and_absolute() {
        let temp = TempDir::new().unwrap();
        for name in ["b - 0002.m4a", "a - 0001.m4a", "cover.jpg", "notes.txt"] {
            fs::write(temp.path().join(name), b"").unwrap();
        }
        fs::create_dir(temp.path().join("extras.m4a")).unwrap();

        let files = list_chapter_files(temp.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(names, vec!["a - 0001.m4a", "b - 0002.m4a"]);
        assert!(files.iter().all(|p| p.is_absolute()));
    }

    #[test]
    fn test_list_chapter_files_skips_nested_folders() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("disc2")).unwrap();
        fs::write(temp.path().join("disc2").join("0001.m4a"), b"").unwrap();

        assert!(list_chapter_files(temp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_list_missing_folder_fails() {
        assert!(list_chapter_files(Path::new("/nonexistent/folder")).is_err());
    }

    #[test]
    fn test_book_string_strips_quotes() {
        assert_eq!(
            book_string_for(Path::new("/books/\"Dune\" - Written by F - Narrated by S")),
            "Dune - Written by F - Narrated by S"
        );
    }

    #[test]
    fn test_default_output_dir() {
        assert_eq!(
            default_output_dir(Path::new("/books/Dune")),
            PathBuf::from("/books/Dune_repack")
        );
    }
}
