//! services/api/src/bin/openapi.rs
//!
//! Writes the OpenAPI document of the inspection API to the path given as the
//! first argument (`openapi.json` by default), creating parent directories.

use api_lib::{error::ApiError, web::ApiDoc};
use std::path::{Path, PathBuf};
use utoipa::OpenApi;

fn write_document(api_doc: &utoipa::openapi::OpenApi, path: &Path) -> Result<(), ApiError> {
    let json = api_doc
        .to_pretty_json()
        .map_err(|e| ApiError::Internal(format!("Failed to serialize OpenAPI document: {}", e)))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)?;
    Ok(())
}

fn main() -> Result<(), ApiError> {
    let path: PathBuf = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("openapi.json"));

    let api_doc = ApiDoc::openapi();
    write_document(&api_doc, &path)?;

    for route in api_doc.paths.paths.keys() {
        println!("  {}", route);
    }
    println!(
        "{} routes written to {}",
        api_doc.paths.paths.len(),
        path.display()
    );
    Ok(())
}
