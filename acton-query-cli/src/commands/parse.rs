use std::path::PathBuf;

use acton_query::config::Config;
use acton_query::parser::{ParseOptions, QueryParser};
use acton_query::schema::ResourceSchema;
use anyhow::{Context, Result};
use clap::Args;

#[derive(Args)]
pub struct ParseArgs {
    /// Resource schema file (TOML, or JSON with a .json extension)
    #[arg(short, long, value_name = "FILE")]
    pub schema: PathBuf,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Do not fall back to the schema's default sort
    #[arg(long)]
    pub no_default_sort: bool,

    /// Emit an empty filter map instead of omitting it
    #[arg(long)]
    pub keep_empty_filter: bool,

    /// Raw query string, with or without the leading `?`
    #[arg(value_name = "QUERY")]
    pub query: String,
}

impl ParseArgs {
    fn options(&self, base: ParseOptions) -> ParseOptions {
        ParseOptions {
            omit_empty_filter: base.omit_empty_filter && !self.keep_empty_filter,
            default_sort_fallback: base.default_sort_fallback && !self.no_default_sort,
        }
    }
}

pub fn execute(args: ParseArgs, config: &Config) -> Result<()> {
    let schema = ResourceSchema::from_file(&args.schema)
        .with_context(|| format!("Failed to load schema: {}", args.schema.display()))?;

    let parser = QueryParser::new(args.options(config.parser));
    let descriptor = parser.parse(&args.query, &schema)?;

    let output = if args.pretty {
        serde_json::to_string_pretty(&descriptor)?
    } else {
        serde_json::to_string(&descriptor)?
    };
    println!("{}", output);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(no_default_sort: bool, keep_empty_filter: bool) -> ParseArgs {
        ParseArgs {
            schema: PathBuf::from("schema.toml"),
            pretty: false,
            no_default_sort,
            keep_empty_filter,
            query: String::new(),
        }
    }

    #[test]
    fn test_flags_override_config() {
        let options = args(true, true).options(ParseOptions::default());
        assert!(!options.omit_empty_filter);
        assert!(!options.default_sort_fallback);
    }

    #[test]
    fn test_config_kept_without_flags() {
        let base = ParseOptions {
            omit_empty_filter: true,
            default_sort_fallback: false,
        };
        assert_eq!(args(false, false).options(base), base);
    }

    #[test]
    fn test_execute_rejects_invalid_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.toml");
        std::fs::write(&path, "[fields.age]\ntype = \"number\"\nfilterable = true\n").unwrap();

        let mut parse_args = args(false, false);
        parse_args.schema = path;
        parse_args.query = "age=abc".to_string();

        let err = execute(parse_args, &Config::default()).unwrap_err();
        assert!(err.to_string().contains("abc is not a valid number for age"));
    }
}
