// tests/migration.rs

//! End-to-end tree migration tests.

mod common;

use common::*;
use jakarta_migrate::{Migration, MigrationConfig};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn migration() -> Migration {
    Migration::new(MigrationConfig::default()).unwrap()
}

fn write(path: &Path, data: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, data).unwrap();
}

#[test]
fn test_fault_in_one_file_does_not_stop_siblings() {
    let temp_dir = TempDir::new().unwrap();
    let src = temp_dir.path().join("webapps");
    let dest = temp_dir.path().join("migrated");

    write(&src.join("WEB-INF/web.xml"), b"<filter-class>javax.servlet.Filter</filter-class>\n");
    write(
        &src.join("WEB-INF/classes/App.class"),
        &class_file("org/example/App", "(Ljavax/servlet/http/HttpServletRequest;)V"),
    );
    write(&src.join("WEB-INF/classes/Broken.class"), &class_file("org/example/Broken", "()V"));
    // A directory in the way makes creating the output file fail
    fs::create_dir_all(dest.join("WEB-INF/classes/Broken.class")).unwrap();

    let report = migration().execute(&src, &dest).unwrap();
    assert!(!report.success);
    assert_eq!(report.stats.files, 3);
    assert_eq!(report.stats.failures, 1);

    assert_eq!(
        fs::read(dest.join("WEB-INF/web.xml")).unwrap(),
        b"<filter-class>jakarta.servlet.Filter</filter-class>\n"
    );
    assert_eq!(
        fs::read(dest.join("WEB-INF/classes/App.class")).unwrap(),
        class_file("org/example/App", "(Ljakarta/servlet/http/HttpServletRequest;)V")
    );
}

#[test]
fn test_truncated_class_is_a_failed_file() {
    let temp_dir = TempDir::new().unwrap();
    let src = temp_dir.path().join("classes");
    let dest = temp_dir.path().join("migrated");

    // Cut off inside the constant pool
    write(&src.join("Truncated.class"), &[0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 61, 0, 9, 1]);
    write(&src.join("notes.txt"), b"javax.websocket\n");

    let report = migration().execute(&src, &dest).unwrap();
    assert!(!report.success);
    assert_eq!(report.stats.files, 2);
    assert_eq!(report.stats.failures, 1);
    assert_eq!(fs::read(dest.join("notes.txt")).unwrap(), b"jakarta.websocket\n");
}

#[test]
fn test_tree_with_archives() {
    let temp_dir = TempDir::new().unwrap();
    let src = temp_dir.path().join("src");
    let dest = temp_dir.path().join("dest");

    let war = build_jar(&[
        entry("META-INF/MANIFEST.MF", SIGNED_MANIFEST.as_bytes()),
        entry("META-INF/ACME.SF", b"sig"),
        entry("WEB-INF/web.xml", b"javax.servlet.http.HttpServlet\n"),
    ]);
    write(&src.join("webapps/app.war"), &war);
    write(&src.join("lib/plain.jar"), &build_jar(&[entry("a.txt", b"javax.el\n")]));
    write(&src.join("conf/server.xml"), b"<Server/>\n");
    fs::create_dir_all(src.join("logs")).unwrap();

    let report = migration().execute(&src, &dest).unwrap();
    assert!(report.success);
    assert_eq!(report.stats.files, 3);
    assert_eq!(report.stats.archives, 2);
    assert_eq!(report.stats.signatures_removed, 1);

    assert!(dest.join("logs").is_dir());
    assert_eq!(fs::read(dest.join("conf/server.xml")).unwrap(), b"<Server/>\n");

    let war_entries = read_jar(&fs::read(dest.join("webapps/app.war")).unwrap());
    assert_eq!(
        entry_names(&war_entries),
        vec!["META-INF/MANIFEST.MF", "WEB-INF/web.xml"]
    );
    assert_eq!(
        find(&war_entries, "WEB-INF/web.xml"),
        b"jakarta.servlet.http.HttpServlet\n"
    );

    let jar_entries = read_jar(&fs::read(dest.join("lib/plain.jar")).unwrap());
    assert_eq!(find(&jar_entries, "a.txt"), b"jakarta.el\n");
}

#[test]
fn test_corrupt_archive_file_is_copied_and_reported() {
    let temp_dir = TempDir::new().unwrap();
    let src = temp_dir.path().join("src");
    let dest = temp_dir.path().join("dest");
    let garbage = b"this is not a zip file at all, just text ".repeat(8);
    write(&src.join("broken.jar"), &garbage);
    write(&src.join("ok.txt"), b"javax.mail\n");

    let report = migration().execute(&src, &dest).unwrap();
    assert!(!report.success);
    assert_eq!(fs::read(dest.join("broken.jar")).unwrap(), garbage);
    assert_eq!(fs::read(dest.join("ok.txt")).unwrap(), b"jakarta.mail\n");
}

#[test]
fn test_excluded_file_copied_unchanged() {
    let temp_dir = TempDir::new().unwrap();
    let src = temp_dir.path().join("src");
    let dest = temp_dir.path().join("dest");
    let jar = build_jar(&[entry("javax/servlet/X.txt", b"javax.servlet\n")]);
    write(&src.join("vendor-legacy.jar"), &jar);

    let migration =
        Migration::new(MigrationConfig::new().with_exclude("*-legacy.jar")).unwrap();
    let report = migration.execute(&src, &dest).unwrap();
    assert!(report.success);
    assert_eq!(report.stats.archives, 0);
    assert_eq!(fs::read(dest.join("vendor-legacy.jar")).unwrap(), jar);
}

#[test]
fn test_single_archive_file() {
    let temp_dir = TempDir::new().unwrap();
    let src = temp_dir.path().join("app.jar");
    let dest = temp_dir.path().join("out/nested/app.jar");
    write(
        &src,
        &build_jar(&[entry("META-INF/MANIFEST.MF", PLAIN_MANIFEST.as_bytes())]),
    );

    let migration = Migration::new(MigrationConfig::new().with_tool_version("9")).unwrap();
    let report = migration.execute(&src, &dest).unwrap();
    assert!(report.success);

    let entries = read_jar(&fs::read(&dest).unwrap());
    assert!(contains(&entries[0].1, "Implementation-Version: 5.0-9"));
}

#[test]
fn test_uncreatable_subdirectory_is_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let src = temp_dir.path().join("src");
    let dest = temp_dir.path().join("dest");
    write(&src.join("a/one.txt"), b"javax.el\n");
    write(&src.join("b/two.txt"), b"javax.el\n");

    // A file where the destination directory `a` would go
    fs::create_dir_all(&dest).unwrap();
    fs::write(dest.join("a"), b"blocker").unwrap();

    let report = migration().execute(&src, &dest).unwrap();
    assert!(!report.success);
    assert_eq!(fs::read(dest.join("b/two.txt")).unwrap(), b"jakarta.el\n");
    assert_eq!(fs::read(dest.join("a")).unwrap(), b"blocker");
}
