mod test_support;

use serde_json::json;
use std::io::{Read, Write};
use test_support::{
    request_err, request_ok, sample_students, select_workspace, spawn_sidecar, temp_dir,
};

fn seeded_workspace(prefix: &str) -> std::path::PathBuf {
    let workspace = temp_dir(prefix);
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "students.import",
        json!({ "students": sample_students() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "attendance.open",
        json!({ "section": "7A", "date": "2024-01-15" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "attendance.setStatus",
        json!({ "studentId": "2024-002", "status": "A" }),
    );
    let _ = request_ok(&mut stdin, &mut reader, "4", "attendance.save", json!({}));
    drop(stdin);
    let _ = child.wait();
    workspace
}

#[test]
fn bundle_restores_into_a_fresh_workspace() {
    let source = seeded_workspace("attendance-backup-src");
    let bundle = source.join("export").join("workspace.zip");
    let target = temp_dir("attendance-backup-dst");

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &source);
    let export = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "backup.exportWorkspaceBundle",
        json!({ "outPath": bundle.to_string_lossy() }),
    );
    assert_eq!(export["bundleFormat"], json!("attendance-workspace-v1"));
    assert_eq!(export["dbSha256"].as_str().expect("sha").len(), 64);

    let file = std::fs::File::open(&bundle).expect("open bundle");
    let mut archive = zip::ZipArchive::new(file).expect("zip");
    let mut manifest = String::new();
    archive
        .by_name("manifest.json")
        .expect("manifest entry")
        .read_to_string(&mut manifest)
        .expect("read manifest");
    let manifest: serde_json::Value = serde_json::from_str(&manifest).expect("manifest json");
    assert_eq!(manifest["format"], json!("attendance-workspace-v1"));
    assert_eq!(manifest["dbSha256"], export["dbSha256"]);

    let imported = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "backup.importWorkspaceBundle",
        json!({ "inPath": bundle.to_string_lossy(), "workspacePath": target.to_string_lossy() }),
    );
    assert_eq!(imported["bundleFormatDetected"], json!("attendance-workspace-v1"));

    // The daemon now serves the restored workspace.
    let health = request_ok(&mut stdin, &mut reader, "3", "health", json!({}));
    assert_eq!(
        health["workspacePath"].as_str(),
        Some(target.to_string_lossy().as_ref())
    );
    let state = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "attendance.open",
        json!({ "section": "7A", "date": "2024-01-15" }),
    );
    assert_eq!(state["savedRecordFound"], json!(true));
    let cruz = state["rows"]
        .as_array()
        .expect("rows")
        .iter()
        .find(|r| r["studentId"] == json!("2024-002"))
        .expect("cruz row");
    assert_eq!(cruz["status"], json!("A"));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn tampered_bundle_is_rejected_and_workspace_survives() {
    let workspace = seeded_workspace("attendance-backup-tamper");
    let bundle = workspace.join("tampered.zip");
    {
        let file = std::fs::File::create(&bundle).expect("create bundle");
        let mut zip = zip::ZipWriter::new(file);
        let opts = zip::write::FileOptions::default();
        zip.start_file("manifest.json", opts).expect("manifest");
        zip.write_all(
            json!({ "format": "attendance-workspace-v1", "dbSha256": "00" })
                .to_string()
                .as_bytes(),
        )
        .expect("write manifest");
        zip.start_file("db/attendance.sqlite3", opts).expect("db");
        zip.write_all(b"not a database").expect("write db");
        zip.finish().expect("finish");
    }

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);
    assert_eq!(
        request_err(
            &mut stdin,
            &mut reader,
            "1",
            "backup.importWorkspaceBundle",
            json!({ "inPath": bundle.to_string_lossy() }),
        ),
        "io_failed"
    );
    assert_eq!(
        request_err(
            &mut stdin,
            &mut reader,
            "2",
            "backup.importWorkspaceBundle",
            json!({ "inPath": workspace.join("missing.zip").to_string_lossy() }),
        ),
        "not_found"
    );

    let sections = request_ok(&mut stdin, &mut reader, "3", "sections.list", json!({}));
    assert_eq!(sections["sections"], json!(["7A", "8B"]));

    drop(stdin);
    let _ = child.wait();
}
