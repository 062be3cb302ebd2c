use std::{fs, path::PathBuf};

use atelier_inventory::openapi::ApiDoc;
use utoipa::OpenApi;

/// Writes the OpenAPI document to `openapi/atelier-inventory.json`.
fn main() -> anyhow::Result<()> {
    let json = ApiDoc::openapi().to_pretty_json()?;

    let output_dir = PathBuf::from("openapi");
    fs::create_dir_all(&output_dir)?;

    let output_path = output_dir.join("atelier-inventory.json");
    fs::write(&output_path, json)?;

    println!("OpenAPI document written to {}", output_path.display());
    Ok(())
}
