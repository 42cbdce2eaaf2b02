//! End-to-end command flows against a real encrypted store

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use ksecret::commands::{self, GetTarget, Session};
use ksecret::SecretOptions;

const PASSWORD: &str = "a1b2c3d4";

fn new_store(dir: &TempDir, name: &str) -> Session {
    let session = Session::new(&dir.path().join(name), PASSWORD);
    commands::cmd_init(&session, false).unwrap();
    session
}

fn set(session: &Session, path: &str, fields: &[&str]) -> Vec<String> {
    let fields: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
    commands::cmd_set(session, path, &fields, &[])
        .unwrap()
        .transcript()
        .to_vec()
}

fn fill(session: &Session) {
    set(session, "/1/A", &["UserName=admin", "Password=secret0"]);
    set(session, "/2/N", &["UserName=user", "Password=secret1"]);
    set(
        session,
        "/A",
        &[
            "=user",
            "Password=secret1",
            "Notes=secret-type=opaque\\nsecret-password=Password\\nsecret-username=UserName",
        ],
    );
}

fn export(session: &Session, out: &Path) -> String {
    commands::cmd_export(session, out).unwrap();
    fs::read_to_string(out).unwrap()
}

fn get(session: &Session, path: &str, field: &str) -> anyhow::Result<String> {
    let value = commands::cmd_get(session, path, &GetTarget::Field(field.to_string()))?;
    Ok(String::from_utf8(value).unwrap())
}

#[test]
fn test_init_message() {
    let dir = TempDir::new().unwrap();
    let session = Session::new(&dir.path().join("team.ksdb"), PASSWORD);
    let report = commands::cmd_init(&session, false).unwrap();
    assert_eq!(
        report.transcript()[0],
        format!("successfully created store: {}", dir.path().join("team.ksdb").display())
    );
    assert!(commands::cmd_list(&session).unwrap().is_empty());
}

#[test]
fn test_get_field() {
    let dir = TempDir::new().unwrap();
    let session = new_store(&dir, "get.ksdb");
    set(&session, "/entry-1", &["UserName=admin1", "Password=abcd"]);

    assert_eq!(get(&session, "/entry-1", "UserName").unwrap(), "admin1");
    assert_eq!(get(&session, "entry-1", "Password").unwrap(), "abcd");

    let err = get(&session, "/entry-1", "Missing").unwrap_err();
    assert_eq!(
        format!("{:#}", err),
        "field 'Missing' does not exist in path '/entry-1'"
    );

    let err = get(&session, "/entry-2", "UserName").unwrap_err();
    assert_eq!(format!("{:#}", err), "path '/entry-2' does not exist");
}

#[test]
fn test_set_then_update() {
    let dir = TempDir::new().unwrap();
    let session = new_store(&dir, "set.ksdb");

    assert_eq!(
        set(&session, "/1/A", &["UserName=admin", "Password=secret1"]),
        vec!["/1/A created"]
    );
    assert_eq!(set(&session, "/1/A", &["Password=secret2"]), vec!["/1/A updated"]);

    let text = export(&session, &dir.path().join("set.json"));
    let records: Vec<serde_json::Value> = serde_json::from_str(&text).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0],
        serde_json::json!({"path": "/1/A", "Title": "A", "Password": "secret2"})
    );
}

#[test]
fn test_set_with_attachment() {
    let dir = TempDir::new().unwrap();
    let session = new_store(&dir, "attach.ksdb");
    let file = dir.path().join("ca.pem");
    fs::write(&file, "-----BEGIN CERTIFICATE-----\n").unwrap();

    commands::cmd_set(
        &session,
        "/tls/ca",
        &["UserName=x".to_string()],
        &[("ca.pem".to_string(), file)],
    )
    .unwrap();

    let value =
        commands::cmd_get(&session, "/tls/ca", &GetTarget::Attachment("ca.pem".into())).unwrap();
    assert_eq!(value, b"-----BEGIN CERTIFICATE-----\n");
}

#[test]
fn test_set_missing_attachment_file_changes_nothing() {
    let dir = TempDir::new().unwrap();
    let session = new_store(&dir, "attach.ksdb");

    let result = commands::cmd_set(
        &session,
        "/tls/ca",
        &["UserName=x".to_string()],
        &[("ca.pem".to_string(), PathBuf::from("/nonexistent/ca.pem"))],
    );
    assert!(result.is_err());
    assert!(commands::cmd_list(&session).unwrap().is_empty());
}

#[test]
fn test_dry_run_set_is_not_saved() {
    let dir = TempDir::new().unwrap();
    let session = new_store(&dir, "dry.ksdb");

    let report = commands::cmd_set(
        &session.clone().dry_run(true),
        "/A",
        &["Password=x".to_string()],
        &[],
    )
    .unwrap();
    assert_eq!(report.transcript(), ["/A created"]);
    assert!(commands::cmd_list(&session).unwrap().is_empty());
}

#[test]
fn test_export_import_roundtrip() {
    let dir = TempDir::new().unwrap();
    let source = new_store(&dir, "export.ksdb");
    fill(&source);
    let out0 = dir.path().join("exported0.json");
    let exported = export(&source, &out0);

    let target = new_store(&dir, "import.ksdb");

    // dry run reports but does not write
    let report = commands::cmd_import(&target.clone().dry_run(true), &out0).unwrap();
    assert_eq!(report.transcript(), ["/A created", "/1/A created", "/2/N created"]);
    assert_eq!(export(&target, &dir.path().join("empty.json")), "[]\n");

    let report = commands::cmd_import(&target, &out0).unwrap();
    assert_eq!(report.transcript(), ["/A created", "/1/A created", "/2/N created"]);

    // second import leaves existing records alone
    let report = commands::cmd_import(&target, &out0).unwrap();
    assert!(report.transcript().is_empty());

    assert_eq!(export(&target, &dir.path().join("exported1.json")), exported);
}

#[test]
fn test_import_missing_file() {
    let dir = TempDir::new().unwrap();
    let session = new_store(&dir, "import.ksdb");
    let input = dir.path().join("missing.json");

    let err = commands::cmd_import(&session, &input).unwrap_err();
    assert_eq!(
        err.to_string(),
        format!("{} file does not exist", input.display())
    );
}

#[test]
fn test_import_missing_path_aborts_whole_batch() {
    let dir = TempDir::new().unwrap();
    let session = new_store(&dir, "import.ksdb");
    let input = dir.path().join("invalid.json");
    fs::write(
        &input,
        r#"[{"path": "/ok", "UserName": "a"}, {"UserName": "admin", "Password": "secret"}]"#,
    )
    .unwrap();

    let err = commands::cmd_import(&session, &input).unwrap_err();
    assert_eq!(err.to_string(), "missing path in entry #1");
    assert!(commands::cmd_list(&session).unwrap().is_empty());
}

#[test]
fn test_import_invalid_json() {
    let dir = TempDir::new().unwrap();
    let session = new_store(&dir, "import.ksdb");
    let input = dir.path().join("invalid.json");
    fs::write(&input, "a\n").unwrap();

    assert!(commands::cmd_import(&session, &input).is_err());
}

#[test]
fn test_secrets_file() {
    let dir = TempDir::new().unwrap();
    let session = new_store(&dir, "secrets.ksdb");
    set(
        &session,
        "/A",
        &[
            "Password=secret1",
            "Notes=secret-type=opaque\\nsecret-namespace=\\nsecret-tags=\\nsecret-password=Password",
        ],
    );
    set(
        &session,
        "/web/cert",
        &[
            "UserName=CERT",
            "Notes=secret-type=tls\\nsecret-tags=edge\\nsecret-namespace=ingress",
        ],
    );

    let out = dir.path().join("secrets.yaml");
    let report = commands::cmd_secrets(&session, &out, &SecretOptions::default()).unwrap();

    assert_eq!(
        fs::read_to_string(&out).unwrap(),
        "apiVersion: v1\nkind: Secret\nmetadata:\n  name: A\ntype: Opaque\ndata:\n  password: c2VjcmV0MQ==\n"
    );
    assert_eq!(report.transcript(), ["secret opaque name=A fields=password"]);
    assert_eq!(report.messages(), vec!["missing Password for entry '/web/cert'"]);

    let options = SecretOptions {
        tag: Some("edge".to_string()),
        ..SecretOptions::default()
    };
    commands::cmd_secrets(&session, &out, &options).unwrap();
    assert_eq!(fs::read_to_string(&out).unwrap(), "");
}

#[test]
fn test_wrong_password() {
    let dir = TempDir::new().unwrap();
    let session = new_store(&dir, "locked.ksdb");
    let intruder = Session::new(session.vault.path(), "guess");

    assert!(commands::cmd_list(&intruder).is_err());
}

#[test]
fn test_recycle_bin_hidden_from_export() {
    let dir = TempDir::new().unwrap();
    let session = new_store(&dir, "trash.ksdb");
    set(&session, "/Recycle Bin/old", &["Password=x"]);
    set(&session, "/live", &["Password=y"]);

    let mut db = session.vault.open(PASSWORD).unwrap();
    let index = db.root.find_group("Recycle Bin").unwrap();
    db.meta.recycle_bin = Some(db.root.groups[index].uuid);
    session.vault.save(&db, PASSWORD).unwrap();

    assert_eq!(commands::cmd_list(&session).unwrap(), vec!["/live"]);
    let text = export(&session, &dir.path().join("out.json"));
    assert!(!text.contains("Recycle Bin"));
}
