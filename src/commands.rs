//! CLI command implementations

use anyhow::Context;
use cascade_core::{
    DeletionOutcome, DeletionPlan, DocumentPath, Settings, compute_deletion_set,
    default_settings_path, execute_deletion,
};
use cascade_vault::{Vault, open_vault};
use std::io::{BufRead, Write};
use std::path::Path;

/// Read settings from `config`, or from the vault's default location.
pub fn load_settings(vault_root: &Path, config: Option<&Path>) -> anyhow::Result<Settings> {
    let path = match config {
        Some(path) => path.to_path_buf(),
        None => default_settings_path(vault_root),
    };
    let settings = Settings::load(&path)
        .with_context(|| format!("invalid settings in {}", path.display()))?;
    tracing::debug!("Settings loaded from {}", path.display());
    Ok(settings)
}

pub async fn plan(vault_root: &Path, root: &str, settings: &Settings) -> anyhow::Result<()> {
    let vault = open_vault(vault_root, settings).await?;
    let root = find_root(&vault, root)?;
    let plan = compute_deletion_set(&vault, &root, settings);

    if plan.is_empty() {
        println!("Nothing to delete from {}", root);
        return Ok(());
    }
    print_plan(&plan);
    Ok(())
}

pub async fn delete(
    vault_root: &Path,
    root: &str,
    settings: &Settings,
    yes: bool,
    json: bool,
) -> anyhow::Result<()> {
    let vault = open_vault(vault_root, settings).await?;
    let root = find_root(&vault, root)?;
    let plan = compute_deletion_set(&vault, &root, settings);

    if plan.is_empty() {
        println!("Nothing to delete from {}", root);
        return Ok(());
    }

    let backup_warning = check_backup(settings)?;
    let ask = settings.confirm_before_delete && !yes;
    if ask {
        print_plan(&plan);
    }
    if let Some(warning) = &backup_warning {
        println!("warning: {}", warning);
    }
    if ask && !confirm(&mut std::io::stdin().lock(), plan.candidates.len())? {
        tracing::info!("Deletion cancelled");
        return Ok(());
    }

    let outcome = execute_deletion(&vault, &plan.candidates, settings).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }

    exit_status(&outcome)
}

/// Surface backup misconfiguration before anything is removed.
///
/// A warning when backup is enabled without a destination, an error when a
/// backup is also required.
fn check_backup(settings: &Settings) -> anyhow::Result<Option<String>> {
    match settings.backup_destination() {
        Ok(_) => Ok(None),
        Err(e) if settings.require_backup => {
            anyhow::bail!("{}; backup is required, nothing was deleted", e)
        }
        Err(e) => Ok(Some(format!("{}; documents will be deleted without backup", e))),
    }
}

/// Warnings are reported in the summary; only failed operations fail the command.
fn exit_status(outcome: &DeletionOutcome) -> anyhow::Result<()> {
    if outcome.failures.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("{} operations failed", outcome.failures.len())
    }
}

pub fn show_config(settings: &Settings) -> anyhow::Result<()> {
    let text = settings
        .to_toml_string()
        .context("cannot serialize settings")?;
    print!("{}", text);
    Ok(())
}

fn find_root(vault: &Vault, input: &str) -> anyhow::Result<DocumentPath> {
    vault
        .find_document(input)
        .with_context(|| format!("no document named {} in {}", input, vault.root().display()))
}

fn print_plan(plan: &DeletionPlan) {
    println!(
        "{} reachable from {}, {} to delete:",
        plan.reachable,
        plan.root,
        plan.candidates.len()
    );
    for doc in &plan.candidates {
        println!("  {}", doc);
    }
}

fn print_outcome(outcome: &DeletionOutcome) {
    println!("Deleted {} documents", outcome.deleted_count());
    if !outcome.backed_up.is_empty() {
        println!("Backed up {} documents", outcome.backed_up.len());
    }
    if !outcome.rewritten.is_empty() {
        println!("Removed references from:");
        for doc in &outcome.rewritten {
            println!("  {}", doc);
        }
    }
    for warning in &outcome.warnings {
        println!("warning: {}", warning);
    }
    for failure in &outcome.failures {
        println!("failed to {} {}: {}", failure.operation, failure.path, failure.message);
    }
}

/// Ask for a yes/no answer. Anything but `y`/`yes` declines.
fn confirm(input: &mut impl BufRead, count: usize) -> anyhow::Result<bool> {
    print!("Delete {} documents? [y/N] ", count);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm_answers() {
        assert!(confirm(&mut "y\n".as_bytes(), 1).unwrap());
        assert!(confirm(&mut "YES\n".as_bytes(), 1).unwrap());
        assert!(!confirm(&mut "\n".as_bytes(), 1).unwrap());
        assert!(!confirm(&mut "nope".as_bytes(), 1).unwrap());
    }

    #[test]
    fn test_backup_problem_reported_before_deletion() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = temp_dir.path().join("cascade.toml");

        std::fs::write(&config, "backup_enabled = true\n").unwrap();
        let settings = load_settings(temp_dir.path(), Some(config.as_path())).unwrap();
        let warning = check_backup(&settings).unwrap().unwrap();
        assert!(warning.contains("without backup"));

        std::fs::write(&config, "backup_enabled = true\nrequire_backup = true\n").unwrap();
        let settings = load_settings(temp_dir.path(), Some(config.as_path())).unwrap();
        assert!(check_backup(&settings).is_err());

        std::fs::write(&config, "backup_enabled = true\nbackup_destination = \"Backups\"\n").unwrap();
        let settings = load_settings(temp_dir.path(), Some(config.as_path())).unwrap();
        assert_eq!(check_backup(&settings).unwrap(), None);
    }

    #[test]
    fn test_warnings_alone_do_not_fail_the_command() {
        let mut outcome = DeletionOutcome {
            warnings: vec!["backup skipped".to_string()],
            ..DeletionOutcome::default()
        };
        assert!(exit_status(&outcome).is_ok());

        outcome.failures.push(cascade_core::OperationFailure {
            path: DocumentPath::from("Note.md"),
            operation: cascade_core::Operation::Delete,
            message: "refused".to_string(),
        });
        assert!(exit_status(&outcome).is_err());
    }

    #[test]
    fn test_load_settings_missing_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let settings = load_settings(temp_dir.path(), None).unwrap();
        assert_eq!(settings, Settings::default());
    }
}
