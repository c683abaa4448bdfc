//! Integration tests for Cascade
//!
//! These tests run the vault and the deletion engine together on real files.

use cascade_core::{
    Corpus, DeletionScope, DocumentPath, RewritePolicy, Settings, compute_deletion_set,
    execute_deletion,
};
use cascade_vault::Vault;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_vault(files: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    for (path, content) in files {
        let full_path = temp_dir.path().join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full_path, content).unwrap();
    }
    temp_dir
}

fn doc(path: &str) -> DocumentPath {
    DocumentPath::from(path)
}

fn read(root: &Path, path: &str) -> String {
    fs::read_to_string(root.join(path)).unwrap()
}

/// A project note with its meeting notes, a shared glossary and an image
fn project_vault() -> TempDir {
    write_vault(&[
        ("Project.md", "# Project\n[[Meetings/Kickoff]]\n[[Meetings/Review]]\n![[chart.png]]\n"),
        ("Meetings/Kickoff.md", "Kickoff, see [[Review]] and [[Glossary]]\n"),
        ("Meetings/Review.md", "Review of [[Kickoff|the kickoff]]\n"),
        ("Glossary.md", "Terms\n"),
        ("media/chart.png", "png"),
        ("Journal.md", "- [[Kickoff]]\nMet about [[Review|the review]] today.\n- [[Other]]\n"),
        ("Other.md", "Unrelated\n"),
    ])
}

#[tokio::test]
async fn test_recursive_delete_with_backup_and_cleanup() {
    let temp_dir = project_vault();
    let root = temp_dir.path();
    let backup_dir = TempDir::new().unwrap();
    let vault = Vault::open(root).await.unwrap();

    let settings = Settings {
        confirm_before_delete: false,
        cleanup_references: true,
        backup_enabled: true,
        backup_destination: Some(backup_dir.path().to_path_buf()),
        reference_rewrite_policy: RewritePolicy::KeepLabel,
        treat_list_item_reference_as_standalone: true,
        ..Settings::default()
    };

    let plan = compute_deletion_set(&vault, &doc("Project.md"), &settings);
    assert_eq!(
        plan.candidates,
        vec![
            doc("Glossary.md"),
            doc("Meetings/Kickoff.md"),
            doc("Meetings/Review.md"),
            doc("media/chart.png"),
        ]
    );

    let outcome = execute_deletion(&vault, &plan.candidates, &settings).await;
    assert!(outcome.is_clean(), "{:?}", outcome.failures);
    assert_eq!(outcome.deleted_count(), 4);
    assert_eq!(outcome.backed_up.len(), 4);
    assert!(outcome.finished_at.is_some());

    for path in ["Glossary.md", "Meetings/Kickoff.md", "media/chart.png"] {
        assert!(!root.join(path).exists());
        assert!(backup_dir.path().join(path).exists());
    }
    assert!(root.join("Project.md").exists());
    assert!(root.join("Other.md").exists());

    assert_eq!(read(root, "Project.md"), "# Project\n");
    assert_eq!(
        read(root, "Journal.md"),
        "Met about the review today.\n- [[Other]]\n"
    );
    assert_eq!(
        outcome.rewritten,
        vec![doc("Journal.md"), doc("Project.md")]
    );
}

#[tokio::test]
async fn test_delete_without_cleanup_leaves_referrers() {
    let temp_dir = project_vault();
    let root = temp_dir.path();
    let vault = Vault::open(root).await.unwrap();
    let settings = Settings {
        recursive_descent: false,
        deletion_scope: DeletionScope::TextOnly,
        ..Settings::default()
    };

    let plan = compute_deletion_set(&vault, &doc("Project.md"), &settings);
    assert_eq!(
        plan.candidates,
        vec![doc("Meetings/Kickoff.md"), doc("Meetings/Review.md")]
    );

    let outcome = execute_deletion(&vault, &plan.candidates, &settings).await;
    assert_eq!(outcome.deleted_count(), 2);
    assert!(outcome.rewritten.is_empty());
    assert!(root.join("Glossary.md").exists());
    assert!(root.join("media/chart.png").exists());
    assert!(read(root, "Journal.md").contains("[[Kickoff]]"));
}

#[tokio::test]
async fn test_backup_required_without_destination_aborts() {
    let temp_dir = project_vault();
    let vault = Vault::open(temp_dir.path()).await.unwrap();
    let settings = Settings {
        backup_enabled: true,
        require_backup: true,
        ..Settings::default()
    };

    let plan = compute_deletion_set(&vault, &doc("Project.md"), &settings);
    let outcome = execute_deletion(&vault, &plan.candidates, &settings).await;

    assert_eq!(outcome.deleted_count(), 0);
    assert_eq!(outcome.warnings.len(), 1);
    assert!(temp_dir.path().join("Glossary.md").exists());
}

#[tokio::test]
async fn test_leaf_root_has_nothing_to_delete() {
    let temp_dir = project_vault();
    let vault = Vault::open(temp_dir.path()).await.unwrap();

    let plan = compute_deletion_set(&vault, &doc("Glossary.md"), &Settings::default());
    assert!(plan.is_empty());
    assert_eq!(plan.reachable, 0);
}

#[tokio::test]
async fn test_settings_file_drives_deletion() {
    let temp_dir = project_vault();
    let root = temp_dir.path();
    fs::create_dir_all(root.join(".cascade")).unwrap();
    fs::write(
        root.join(".cascade/config.toml"),
        "deletion_scope = \"attachments-only\"\ncleanupReferences = true\nreference_rewrite_policy = \"placeholder\"\n",
    )
    .unwrap();

    let settings = Settings::load(&cascade_core::default_settings_path(root)).unwrap();
    let vault = Vault::open(root).await.unwrap();
    assert_eq!(vault.document_count(), 7);

    let plan = compute_deletion_set(&vault, &doc("Project.md"), &settings);
    assert_eq!(plan.candidates, vec![doc("media/chart.png")]);

    let outcome = execute_deletion(&vault, &plan.candidates, &settings).await;
    assert!(outcome.is_clean());
    assert_eq!(
        read(root, "Project.md"),
        "# Project\n[[Meetings/Kickoff]]\n[[Meetings/Review]]\n"
    );
    assert!(vault.outgoing_references(&doc("Project.md")).unwrap().embeds.is_empty());
}
