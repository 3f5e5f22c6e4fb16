//! Show command implementation.

use super::record_to_json;
use modelreg_core::{ModelId, Registry};

/// Runs the show command.
pub fn run(registry: &Registry, id: &str, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let id = ModelId::from(id);
    let Some(record) = registry.retrieve(&id)? else {
        return Err(format!("Model {id} not found").into());
    };

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&record_to_json(&record))?),
        _ => {
            println!("id: {id}");
            for (name, value) in record.fields() {
                println!("{name}: {value}");
            }
            let dir = registry.model_dir(&id)?;
            let state = if dir.is_dir() { "" } else { " (missing)" };
            println!("directory: {}{state}", dir.display());
        }
    }

    Ok(())
}
