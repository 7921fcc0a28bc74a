//! Integration tests for the PDF batch library

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use tempfile::TempDir;

use pdf_batch::model::{OutputOptions, PageSelection, PickedFile, TextEdit};
use pdf_batch::pdf::load_document;
use pdf_batch::pipeline::{build, RunInput};
use pdf_batch::platform::{
    AlwaysGranted, FileStore, LocalFiles, Outcome, PermissionGate, ShareRequest, ShareTarget,
};
use pdf_batch::{Collaborators, Session, UserError};

/// Write a Letter-sized PDF whose pages show `<prefix>-<n>`
fn fixture(dir: &Path, prefix: &str, num_pages: u32) -> PathBuf {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });

    let mut kids = Vec::new();
    for i in 0..num_pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new(
                    "Tj",
                    vec![Object::string_literal(format!("{}-{}", prefix, i + 1))],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => num_pages as i64,
            "Kids" => kids,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let path = dir.join(format!("{}.pdf", prefix));
    doc.save(&path).expect("Failed to write fixture");
    path
}

fn picked(path: &Path) -> PickedFile {
    PickedFile {
        uri: path.to_path_buf(),
        name: path.file_name().map(|n| n.to_string_lossy().to_string()),
        size: std::fs::metadata(path).ok().map(|m| m.len()),
    }
}

/// Labels drawn by the fixtures, in output page order
fn page_labels(doc: &Document) -> Vec<String> {
    doc.get_pages()
        .into_values()
        .filter_map(|id| {
            let content = Content::decode(&doc.get_page_content(id).ok()?).ok()?;
            content.operations.iter().find_map(|op| {
                (op.operator == "Tj")
                    .then(|| op.operands.first()?.as_str().ok())
                    .flatten()
                    .map(|s| String::from_utf8_lossy(s).to_string())
            })
        })
        .collect()
}

fn page_content(doc: &Document, index: usize) -> String {
    let id = doc.get_pages().into_values().nth(index).unwrap();
    String::from_utf8_lossy(&doc.get_page_content(id).unwrap()).to_string()
}

#[derive(Default)]
struct RecordingShare {
    requests: RefCell<Vec<ShareRequest>>,
}

impl ShareTarget for RecordingShare {
    fn share(&self, request: &ShareRequest) -> pdf_batch::Result<()> {
        self.requests.borrow_mut().push(request.clone());
        Ok(())
    }
}

/// Counts every file-system call it forwards
#[derive(Default)]
struct CountingFiles {
    calls: Cell<usize>,
}

impl FileStore for CountingFiles {
    fn read_bytes(&self, path: &Path) -> pdf_batch::Result<Vec<u8>> {
        self.calls.set(self.calls.get() + 1);
        LocalFiles.read_bytes(path)
    }

    fn write_bytes(&self, path: &Path, bytes: &[u8]) -> pdf_batch::Result<()> {
        self.calls.set(self.calls.get() + 1);
        LocalFiles.write_bytes(path, bytes)
    }
}

struct Denied;

impl PermissionGate for Denied {
    fn request_storage_access(&self) -> bool {
        false
    }
}

fn run_input(sources: &[PathBuf], out: &Path) -> RunInput {
    let mut session = Session::new(out);
    session.add_documents(Outcome::Ok(sources.iter().map(|p| picked(p)).collect()));
    session.snapshot()
}

#[test]
fn test_full_copy_sums_page_counts() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let sources = vec![
        fixture(temp_dir.path(), "one", 1),
        fixture(temp_dir.path(), "three", 3),
        fixture(temp_dir.path(), "two", 2),
    ];

    let mut session = Session::new(temp_dir.path().join("out"));
    session.add_documents(Outcome::Ok(sources.iter().map(|p| picked(p)).collect()));

    let share = RecordingShare::default();
    let with = Collaborators {
        permissions: &AlwaysGranted,
        files: &LocalFiles,
        share: &share,
    };
    let output = session.process(&with).expect("Processing should succeed");

    let doc = Document::load(&output).expect("Output should load");
    assert_eq!(doc.get_pages().len(), 6);
    assert_eq!(
        page_labels(&doc),
        vec!["one-1", "three-1", "three-2", "three-3", "two-1", "two-2"]
    );

    // Working state is reset after success
    assert!(session.sources().is_empty());
    assert!(session.last_error().is_none());

    let requests = share.requests.borrow();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url, output);
    assert_eq!(requests[0].mime_type, "application/pdf");
}

#[test]
fn test_page_selection_is_ascending_and_per_document() {
    let temp_dir = TempDir::new().unwrap();
    let sources = vec![
        fixture(temp_dir.path(), "short", 2),
        fixture(temp_dir.path(), "long", 6),
    ];

    let mut input = run_input(&sources, temp_dir.path());
    input.selection = [5, 1, 3].into_iter().collect::<PageSelection>();
    input.options.use_object_streams = false;

    let bytes = build(&input, &LocalFiles).unwrap();
    let doc = Document::load_mem(&bytes).unwrap();

    assert_eq!(page_labels(&doc), vec!["short-2", "long-2", "long-4", "long-6"]);
}

#[test]
fn test_text_edits_keep_insertion_order() {
    let temp_dir = TempDir::new().unwrap();
    let sources = vec![fixture(temp_dir.path(), "doc", 1)];

    let mut input = run_input(&sources, temp_dir.path());
    for text in ["A", "B"] {
        input.edits.push(TextEdit {
            page_index: 0,
            x: 50.0,
            y: 50.0,
            text: text.to_string(),
        });
    }

    let doc = Document::load_mem(&build(&input, &LocalFiles).unwrap()).unwrap();
    let content = page_content(&doc, 0);
    let a = content.find("(A) Tj").expect("A should be drawn");
    let b = content.find("(B) Tj").expect("B should be drawn");
    assert!(a < b, "B should be drawn after A");
}

#[test]
fn test_out_of_range_edit_leaves_output_unchanged() {
    let temp_dir = TempDir::new().unwrap();
    let sources = vec![fixture(temp_dir.path(), "doc", 2)];

    let mut input = run_input(&sources, temp_dir.path());
    input.options.use_object_streams = false;
    input.edits.push(TextEdit {
        page_index: 1,
        text: "kept".to_string(),
        ..Default::default()
    });
    let baseline = build(&input, &LocalFiles).unwrap();

    input.edits.push(TextEdit {
        page_index: 2,
        text: "dropped".to_string(),
        ..Default::default()
    });
    let with_extra = build(&input, &LocalFiles).unwrap();

    assert_eq!(baseline, with_extra);
}

#[test]
fn test_watermark_on_every_page() {
    let temp_dir = TempDir::new().unwrap();
    let sources = vec![
        fixture(temp_dir.path(), "a", 2),
        fixture(temp_dir.path(), "b", 1),
    ];

    let mut session = Session::new(temp_dir.path());
    session.add_documents(Outcome::Ok(sources.iter().map(|p| picked(p)).collect()));
    session.set_watermark_with_opacity("CONFIDENTIAL", 0.25);
    let input = session.snapshot();

    let doc = Document::load_mem(&build(&input, &LocalFiles).unwrap()).unwrap();
    let pages: Vec<_> = doc.get_pages().into_values().collect();
    assert_eq!(pages.len(), 3);

    for (index, page_id) in pages.into_iter().enumerate() {
        let content = page_content(&doc, index);
        assert!(content.contains("(CONFIDENTIAL) Tj"), "page {} lacks watermark", index);

        let page = doc.get_dictionary(page_id).unwrap();
        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        let states = resources.get(b"ExtGState").unwrap().as_dict().unwrap();
        let (_, state_ref) = states.iter().next().expect("watermark graphics state");
        let state = doc.get_dictionary(state_ref.as_reference().unwrap()).unwrap();
        let alpha = state.get(b"ca").unwrap().as_float().unwrap();
        assert!((alpha - 0.25).abs() < 1e-4, "page {} opacity {}", index, alpha);
    }
}

#[test]
fn test_password_protects_output() {
    let temp_dir = TempDir::new().unwrap();
    let sources = vec![fixture(temp_dir.path(), "secret", 2)];

    let mut input = run_input(&sources, temp_dir.path());
    input.options = OutputOptions {
        password: Some("hunter2".to_string()),
        ..Default::default()
    };
    let bytes = build(&input, &LocalFiles).unwrap();

    // Opening without the password must not expose any pages
    let locked = Document::load_mem(&bytes).expect("encrypted output should still parse");
    assert!(locked.is_encrypted());
    assert!(locked.get_pages().is_empty());

    assert!(locked.authenticate_password("hunter2").is_ok());
    assert!(locked.authenticate_password("").is_err());

    assert!(load_document(&bytes, Some("hunter2")).is_ok());
    assert!(matches!(
        load_document(&bytes, Some("letmein")),
        Err(pdf_batch::Error::Encryption(_))
    ));
}

#[test]
fn test_cancelled_picker_leaves_state() {
    let temp_dir = TempDir::new().unwrap();
    let source = fixture(temp_dir.path(), "kept", 1);

    let mut session = Session::new(temp_dir.path());
    session.add_documents(Outcome::Ok(vec![picked(&source)]));
    session.add_documents(Outcome::Cancelled);

    assert_eq!(session.sources().len(), 1);
    assert!(session.last_error().is_none());
}

#[test]
fn test_empty_run_does_no_io() {
    let temp_dir = TempDir::new().unwrap();
    let mut session = Session::new(temp_dir.path());
    session.add_text_edit();

    let files = CountingFiles::default();
    let share = RecordingShare::default();
    let with = Collaborators {
        permissions: &AlwaysGranted,
        files: &files,
        share: &share,
    };

    assert!(session.process(&with).is_none());
    assert_eq!(files.calls.get(), 0);
    assert!(share.requests.borrow().is_empty());
    assert_eq!(session.text_edits().len(), 1);
    assert!(session.last_error().is_none());
}

#[test]
fn test_unreadable_source_keeps_state() {
    let temp_dir = TempDir::new().unwrap();
    let good = fixture(temp_dir.path(), "good", 1);
    let bad = temp_dir.path().join("bad.pdf");
    std::fs::write(&bad, b"this is not a pdf").unwrap();

    let mut session = Session::new(temp_dir.path().join("out"));
    session.add_documents(Outcome::Ok(vec![picked(&good), picked(&bad)]));
    let edit = session.add_text_edit();
    session.update_text(edit, "note");
    let before = session.snapshot();

    let share = RecordingShare::default();
    let with = Collaborators {
        permissions: &AlwaysGranted,
        files: &LocalFiles,
        share: &share,
    };

    assert!(session.process(&with).is_none());
    assert_eq!(session.snapshot(), before);
    assert_eq!(session.last_error(), Some(UserError::ProcessingFailed));
    assert!(!session.last_error().unwrap().to_string().is_empty());
    assert!(share.requests.borrow().is_empty());
    assert!(!temp_dir.path().join("out").exists());
}

#[test]
fn test_permission_denied_loads_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let source = fixture(temp_dir.path(), "doc", 1);

    let mut session = Session::new(temp_dir.path());
    session.add_documents(Outcome::Ok(vec![picked(&source)]));

    let files = CountingFiles::default();
    let with = Collaborators {
        permissions: &Denied,
        files: &files,
        share: &RecordingShare::default(),
    };

    assert!(session.process(&with).is_none());
    assert_eq!(files.calls.get(), 0);
    assert_eq!(session.last_error(), Some(UserError::PermissionDenied));
    assert_eq!(session.sources().len(), 1);
}
