use camino::Utf8PathBuf;
use pipit::config::Config;
use pipit::run::run;

#[test]
fn checks_a_directory_of_python_files_and_reports_an_incompatible_assignment() {
    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("m.py");
    std::fs::write(&file_path, "x: int = 1\nx = 1\n").unwrap();

    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
    let config = Config::default();
    let summary = run(&[root], &config);

    assert_eq!(summary.files_checked, 1);
}

#[test]
fn skips_non_python_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("notes.txt"), "not python").unwrap();
    std::fs::write(dir.path().join("m.py"), "x = 1\n").unwrap();

    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
    let config = Config::default();
    let summary = run(&[root], &config);

    assert_eq!(summary.files_checked, 1);
}
