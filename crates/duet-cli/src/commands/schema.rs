use anyhow::Context;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::SchemaArgs;
use crate::output::output;
use crate::schema::SchemaRegistry;

#[derive(Debug, Serialize)]
struct CheckResponse<'a> {
    schema: &'a str,
    file: String,
    valid: bool,
}

/// Handle `duet schema`.
pub fn handle(args: &SchemaArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let registry = SchemaRegistry::new();

    let Some(name) = args.type_name.as_deref() else {
        return output(&registry.list(), flags.format);
    };

    let Some(path) = &args.check else {
        let schema = registry.get(name).with_context(|| {
            format!(
                "unknown schema '{name}' (known: {})",
                registry.list().join(", ")
            )
        })?;
        return output(schema, flags.format);
    };

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let instance: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    registry.validate(name, &instance)?;

    output(
        &CheckResponse {
            schema: name,
            file: path.display().to_string(),
            valid: true,
        },
        flags.format,
    )
}
