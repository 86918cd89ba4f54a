use std::path::PathBuf;

use acton_query::schema::{ResolvedSchema, ResourceSchema};
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

#[derive(Args)]
pub struct CheckArgs {
    /// Resource schema file (TOML, or JSON with a .json extension)
    #[arg(short, long, value_name = "FILE")]
    pub schema: PathBuf,
}

/// Counts reported for a schema
#[derive(Debug, PartialEq, Eq)]
struct Summary {
    fields: usize,
    filterable: usize,
    sortable: usize,
    relations: usize,
}

impl Summary {
    fn of(schema: &ResolvedSchema) -> Self {
        Self {
            fields: schema.fields.len(),
            filterable: schema.fields.values().filter(|f| f.filterable).count(),
            sortable: schema.fields.values().filter(|f| f.sortable).count(),
            relations: schema.related.len(),
        }
    }
}

pub fn execute(args: CheckArgs) -> Result<()> {
    let schema = ResourceSchema::from_file(&args.schema)
        .with_context(|| format!("Invalid schema: {}", args.schema.display()))?
        .resolve();
    let summary = Summary::of(&schema);

    println!("{} {}", "✓".green().bold(), args.schema.display());
    println!(
        "  {} fields ({} filterable, {} sortable), {} relations",
        summary.fields, summary.filterable, summary.sortable, summary.relations
    );
    println!(
        "  limit {} (max {}), unlimited fetch {}",
        schema.default_limit,
        schema.max_limit,
        if schema.allow_no_limit { "allowed" } else { "disabled" }
    );

    for (name, field) in &schema.fields {
        let operators = field
            .effective_operators()
            .iter()
            .map(|op| op.as_str())
            .collect::<Vec<_>>()
            .join(",");
        println!(
            "  {} {} [{}]{}",
            name.cyan(),
            field.field_type.to_string().dimmed(),
            if field.filterable { operators.as_str() } else { "-" },
            if field.sortable { " sortable" } else { "" }
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use acton_query::schema::{FieldSchema, FieldType, RelationSchema};

    #[test]
    fn test_summary_counts() {
        let schema = ResourceSchema::new()
            .with_field("name", FieldSchema::new(FieldType::String).filterable().sortable())
            .with_field("age", FieldSchema::new(FieldType::Number).sortable())
            .with_field("notes", FieldSchema::new(FieldType::String))
            .with_relation("posts", RelationSchema::new("Post", ["id"]))
            .resolve();

        assert_eq!(
            Summary::of(&schema),
            Summary {
                fields: 3,
                filterable: 1,
                sortable: 2,
                relations: 1,
            }
        );
    }

    #[test]
    fn test_execute_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = execute(CheckArgs {
            schema: dir.path().join("missing.toml"),
        })
        .unwrap_err();
        assert!(err.to_string().starts_with("Invalid schema"));
    }
}
