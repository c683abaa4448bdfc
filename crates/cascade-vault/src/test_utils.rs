//! Test utilities for Cascade vaults

use std::fs;
use tempfile::TempDir;

/// Create a temporary vault with the given `(path, content)` files
pub fn create_vault_with_structure(structure: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    for (path, content) in structure {
        let full_path = root.join(path);

        // Create parent directories if needed
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }

        fs::write(&full_path, content).unwrap();
    }

    temp_dir
}

/// A small vault with a cycle, an embed, a backlink and host config files
pub fn create_sample_vault() -> TempDir {
    create_vault_with_structure(&[
        ("Projects/Alpha.md", "# Alpha\nSee [[Beta]] and ![[diagram.png]]\n"),
        ("Projects/Beta.md", "# Beta\nBack to [[Alpha|the start]].\n[[Gamma]]\n"),
        ("Archive/Gamma.md", "Gamma links [[Projects/Alpha]]\n"),
        ("assets/diagram.png", "not really a png"),
        ("Index.md", "- [[Alpha]]\n- [[Beta]]\nRead [[Gamma#Summary]] first.\n"),
        (".obsidian/workspace.json", "{\"active\": \"[[Alpha]]\"}"),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_sample_vault() {
        let temp_dir = create_sample_vault();
        let root = temp_dir.path();

        assert!(root.join("Projects/Alpha.md").exists());
        assert!(root.join("assets/diagram.png").exists());
        assert!(root.join(".obsidian/workspace.json").exists());
    }
}
