//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::config::GraphConfig;
use nscalar_core::{
    Network, ScalarError, ScalarGraph, blueprints_from_bytes, blueprints_to_bytes,
    formats::MAX_PERSISTENCE_PAYLOAD_SIZE,
};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE VALIDATION
// =============================================================================

/// Validate an input file: it must exist, be a regular file and fit `max_size`.
fn validate_input_file(path: &Path, max_size: u64) -> Result<PathBuf, ScalarError> {
    let canonical = path.canonicalize().map_err(|e| {
        ScalarError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(ScalarError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    let metadata = std::fs::metadata(&canonical)
        .map_err(|e| ScalarError::IoError(format!("Cannot read file metadata: {}", e)))?;
    if metadata.len() > max_size {
        return Err(ScalarError::DeserializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }

    Ok(canonical)
}

/// Validate an output path: its parent directory must exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, ScalarError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        ScalarError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(ScalarError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| ScalarError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// EVAL COMMAND
// =============================================================================

/// Evaluate `names` (or every canonical name when empty), in order.
pub fn evaluate_names(
    graph: &mut ScalarGraph,
    names: &[String],
) -> Result<Vec<(String, f64)>, ScalarError> {
    let names: Vec<String> = if names.is_empty() {
        graph
            .registry()
            .canonical_names()
            .map(|(name, _)| name.to_string())
            .collect()
    } else {
        names.to_vec()
    };

    names
        .into_iter()
        .map(|name| {
            let id = graph
                .retrieve(&name)
                .ok_or_else(|| ScalarError::InvalidName(name.clone()))?;
            let value = graph.evaluate(id)?;
            Ok((name, value))
        })
        .collect()
}

/// Build the described graph and print the requested evaluations.
pub fn cmd_eval(config_path: &Path, names: &[String], json_mode: bool) -> Result<(), ScalarError> {
    let config = GraphConfig::load(config_path)?;
    let mut graph = config.build()?;
    let results = evaluate_names(&mut graph, names)?;

    if json_mode {
        let values: serde_json::Map<String, serde_json::Value> = results
            .iter()
            .map(|(name, value)| (name.clone(), serde_json::json!(value)))
            .collect();
        let output = serde_json::json!({
            "config": config_path.to_string_lossy(),
            "node_count": graph.len(),
            "values": values
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    for (name, value) in &results {
        println!("{} = {}", name, value);
    }
    Ok(())
}

// =============================================================================
// PACK COMMAND
// =============================================================================

/// Write the blueprints of a description to `output`.
pub fn cmd_pack(config_path: &Path, output: &Path, json_mode: bool) -> Result<(), ScalarError> {
    let config = GraphConfig::load(config_path)?;
    let mut graph: ScalarGraph = ScalarGraph::new();
    for entry in &config.blueprints {
        graph.add_blueprint(&entry.name, entry.inputs.iter().cloned(), entry.network()?)?;
    }

    let validated_output = validate_output_path(output)?;
    let data = blueprints_to_bytes(graph.registry())?;
    std::fs::write(&validated_output, &data)
        .map_err(|e| ScalarError::IoError(format!("Failed to write file: {}", e)))?;

    tracing::info!(
        blueprints = graph.registry().blueprint_count(),
        bytes = data.len(),
        "blueprints packed"
    );

    if json_mode {
        let output = serde_json::json!({
            "output": validated_output.to_string_lossy(),
            "blueprints": graph.registry().blueprint_count(),
            "bytes": data.len()
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!(
        "Packed {} blueprints ({} bytes) to {:?}",
        graph.registry().blueprint_count(),
        data.len(),
        validated_output
    );
    Ok(())
}

// =============================================================================
// INSPECT COMMAND
// =============================================================================

/// List the blueprints stored in a packed file.
pub fn cmd_inspect(path: &Path, json_mode: bool) -> Result<(), ScalarError> {
    let validated_path = validate_input_file(path, MAX_PERSISTENCE_PAYLOAD_SIZE as u64)?;
    let data = std::fs::read(&validated_path)
        .map_err(|e| ScalarError::IoError(format!("Failed to read file: {}", e)))?;
    let registry = blueprints_from_bytes(&data)?;

    if json_mode {
        let blueprints: Vec<serde_json::Value> = registry
            .blueprints()
            .map(|(name, blueprint)| {
                serde_json::json!({
                    "name": name,
                    "inputs": blueprint.input_names,
                    "layers": Network::<f64>::num_layers(&blueprint.network),
                    "parameters": blueprint.network.parameter_count(),
                    "seed": blueprint.network.seed()
                })
            })
            .collect();
        let output = serde_json::json!({
            "file": validated_path.to_string_lossy(),
            "blueprints": blueprints
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Packed Blueprints");
    println!("=================");
    println!("File: {:?}", validated_path);
    println!();
    for (name, blueprint) in registry.blueprints() {
        println!(
            "{:<16} <- [{}]  layers: {}  parameters: {}",
            name,
            blueprint.input_names.join(", "),
            Network::<f64>::num_layers(&blueprint.network),
            blueprint.network.parameter_count()
        );
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
