//! The `pillarscore init` command.

use std::path::Path;

use anyhow::{Context, Result};

const FORM_PATH: &str = "forms/diagnostico-3f.toml";

pub fn execute() -> Result<()> {
    write_if_missing(Path::new("pillarscore.toml"), SAMPLE_CONFIG)?;

    std::fs::create_dir_all("forms").context("failed to create forms/")?;
    write_if_missing(Path::new(FORM_PATH), THREE_PILLAR_FORM)?;

    println!("\nNext steps:");
    println!("  1. Answer the form: write answers.json with question id -> points");
    println!("  2. Run: pillarscore score --answers answers.json");
    println!("  3. Run: pillarscore responses --form {FORM_PATH}");

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# pillarscore configuration

default_form = "forms/diagnostico-3f.toml"
share_base_url = "http://localhost:8080"
max_token_attempts = 10

[store]
type = "file"
path = "./pillarscore-data"

# To record into a PostgREST/Supabase project instead:
#
# [store]
# type = "rest"
# base_url = "https://<project>.supabase.co/rest/v1"
# api_key = "${PILLARSCORE_API_KEY}"
"#;

const THREE_PILLAR_FORM: &str = include_str!("../../../../forms/diagnostico-3f.toml");
