use std::io::Read;

use clap::Parser;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use dtd2bq::{Column, ResolveOptions, SchemaField};

#[derive(Parser)]
#[command(name = "dtd2bq", about = "Convert a DTD into a nested column schema (JSON)")]
struct Cli {
    /// DTD file (reads from stdin if not provided or `-`)
    file: Option<std::path::PathBuf>,

    /// Root element to convert
    #[arg(long, short = 'r')]
    root: String,

    /// Field name for element text next to attribute columns
    #[arg(long, default_value = dtd2bq::resolver::DEFAULT_DETAIL_FIELD)]
    detail_field: String,

    /// Indent the JSON output
    #[arg(long)]
    pretty: bool,

    /// Print the root's field list instead of the root column
    #[arg(long)]
    fields_only: bool,

    /// Fail when any referenced element is never declared
    #[arg(long)]
    strict: bool,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let input = read_input(cli.file.as_deref())?;
    let options = ResolveOptions {
        detail_field: cli.detail_field.clone(),
    };

    let resolution = dtd2bq::convert(&input, &cli.root, &options).map_err(|e| e.to_string())?;
    for name in &resolution.unresolved {
        warn!(element = %name, "element referenced but not declared");
    }
    if cli.strict && !resolution.unresolved.is_empty() {
        return Err(format!(
            "{} undeclared element(s) referenced",
            resolution.unresolved.len()
        ));
    }

    let column = resolution
        .column
        .ok_or_else(|| format!("element `{}` has no representable content", cli.root))?;
    println!("{}", render(&column, cli.pretty, cli.fields_only)?);
    Ok(())
}

fn read_input(file: Option<&std::path::Path>) -> Result<String, String> {
    match file {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display())),
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| format!("failed to read stdin: {e}"))?;
            Ok(buf)
        }
    }
}

fn render(column: &Column, pretty: bool, fields_only: bool) -> Result<String, String> {
    let mut tree = column.to_output_tree();
    let result = if fields_only {
        let fields: Vec<SchemaField> = match tree.fields.take() {
            Some(fields) => fields,
            None => vec![tree],
        };
        to_json(&fields, pretty)
    } else {
        to_json(&tree, pretty)
    };
    result.map_err(|e| format!("failed to encode schema: {e}"))
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}
