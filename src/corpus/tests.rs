use super::*;
use tempfile::TempDir;

fn test_config(temp_dir: &TempDir) -> Config {
    Config::load(temp_dir.path()).expect("defaults should load")
}

#[test]
fn add_creates_directory_and_writes_file() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = test_config(&temp_dir);

    add_document(&config, "prospectus.pdf", b"%PDF-1.5 fake").expect("add should succeed");

    let written = config.documents_dir().join("prospectus.pdf");
    assert!(written.is_file());
    assert_eq!(
        fs::read(written).expect("should read back"),
        b"%PDF-1.5 fake"
    );
}

#[test]
fn add_rejects_non_pdf_extension() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = test_config(&temp_dir);

    let result = add_document(&config, "notes.txt", b"plain text");

    assert!(matches!(result, Err(RagError::InvalidDocument(_))));
    assert!(!config.documents_dir().join("notes.txt").exists());
}

#[test]
fn add_rejects_path_traversal() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = test_config(&temp_dir);

    for filename in ["../escape.pdf", "nested/inner.pdf", "back\\slash.pdf", ".pdf"] {
        let result = add_document(&config, filename, b"x");
        assert!(
            matches!(result, Err(RagError::InvalidDocument(_))),
            "{} should be rejected",
            filename
        );
    }
}

#[test]
fn add_replaces_existing_file() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = test_config(&temp_dir);

    add_document(&config, "fees.pdf", b"old").expect("first add should succeed");
    add_document(&config, "fees.pdf", b"new").expect("second add should succeed");

    assert_eq!(
        fs::read(config.documents_dir().join("fees.pdf")).expect("should read back"),
        b"new"
    );
}

#[test]
fn add_from_path_uses_source_filename() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = test_config(&temp_dir);
    let source = temp_dir.path().join("handbook.pdf");
    fs::write(&source, b"handbook bytes").expect("should write source");

    let filename =
        add_document_from_path(&config, &source).expect("add from path should succeed");

    assert_eq!(filename, "handbook.pdf");
    assert!(config.documents_dir().join("handbook.pdf").is_file());
}

#[test]
fn remove_reports_whether_file_existed() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = test_config(&temp_dir);
    add_document(&config, "prospectus.pdf", b"bytes").expect("add should succeed");

    assert!(remove_document(&config, "prospectus.pdf").expect("remove should succeed"));
    assert!(!config.documents_dir().join("prospectus.pdf").exists());

    // Idempotent: removing again succeeds but reports absence
    assert!(!remove_document(&config, "prospectus.pdf").expect("remove should succeed"));
}

#[test]
fn list_is_sorted_and_ignores_non_pdfs() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = test_config(&temp_dir);
    add_document(&config, "zeta.pdf", b"z").expect("add should succeed");
    add_document(&config, "alpha.pdf", b"a").expect("add should succeed");
    fs::write(config.documents_dir().join("readme.txt"), b"not a pdf")
        .expect("should write stray file");

    let listed = list_documents(&config).expect("list should succeed");

    assert_eq!(listed, vec!["alpha.pdf".to_string(), "zeta.pdf".to_string()]);
}

#[test]
fn list_of_missing_directory_is_empty() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = test_config(&temp_dir);

    assert!(list_documents(&config).expect("list should succeed").is_empty());
}
