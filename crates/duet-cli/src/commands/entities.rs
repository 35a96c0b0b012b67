use anyhow::Context;
use duet_config::DuetConfig;
use duet_core::entities::EntityGraph;
use duet_negotiate::Analyzer;
use serde::Serialize;

use crate::cli::root_commands::EntitiesArgs;
use crate::cli::{GlobalFlags, OutputFormat};
use crate::output::output;

#[derive(Debug, Serialize)]
struct EntityRow {
    id: String,
    name: String,
    kind: String,
    depth: u32,
    lines: String,
    calls: usize,
}

/// Handle `duet entities`. No oracle is involved; only `builder` settings apply.
pub fn handle(args: &EntitiesArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let config = DuetConfig::load_with_dotenv().context("failed to load configuration")?;
    let analyzer = Analyzer::from_config(config)?;
    let graph = analyzer
        .build_graph_from_file(&args.file, args.language)
        .with_context(|| format!("failed to read entities from {}", args.file.display()))?;

    if flags.format == OutputFormat::Table {
        output(&entity_rows(&graph), flags.format)
    } else {
        output(&graph, flags.format)
    }
}

fn entity_rows(graph: &EntityGraph) -> Vec<EntityRow> {
    graph
        .entities()
        .iter()
        .map(|entity| EntityRow {
            id: entity.id.to_string(),
            name: graph.qualified_name(entity.id),
            kind: entity.kind.to_string(),
            depth: entity.depth,
            lines: format!("{}-{}", entity.line_range.start(), entity.line_range.end()),
            calls: entity.calls.len(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use duet_parser::{Language, build_entity_graph};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn rows_use_qualified_names() {
        let source = "class Cart:\n    def add(self, item):\n        self.total()\n\n    def total(self):\n        return 0\n";
        let graph = build_entity_graph(source, Language::Python).unwrap();
        let rows = entity_rows(&graph);

        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Cart", "Cart.add", "Cart.total"]);
        assert_eq!(rows[1].id, "e2");
        assert_eq!(rows[1].depth, 1);
        assert_eq!(rows[1].lines, "2-3");
        assert_eq!(rows[1].calls, 1);
    }
}
