use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a temporary project directory holding `(relative path, content)`
/// files, creating parent directories as needed
pub fn create_test_project(files: &[(&str, &str)]) -> TempDir {
    let project = tempfile::tempdir().unwrap();
    for (path, content) in files {
        create_test_file(&project, path, content);
    }
    project
}

/// Create a test file under the project root
pub fn create_test_file(project: &TempDir, path: &str, content: &str) -> PathBuf {
    let file_path = project.path().join(path);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&file_path, content).unwrap();
    file_path
}
