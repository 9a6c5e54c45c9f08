//! Command-line interface for weft
//!
//! Usage:
//!   weft `<path>` [--tpl] [--config `<file>`] [--tpl-ld `<ld>`] [--tpl-rd `<rd>`] [--format `<format>`]
//!                                                                   - Parse a file and print it
//!   weft --list-formats                                             - List all available formats
//!
//! Configuration is layered: built-in defaults, then `weft.toml` in the working directory
//! when present, then `--config`, then the delimiter flags.
//!
//! Logging goes to stderr and is controlled by `WEFT_LOG` (default `warn`).

use clap::{Arg, ArgAction, Command};
use tracing_subscriber::EnvFilter;
use weft::formats::FormatRegistry;
use weft::{parse_to_ast, Loader, SourceFile};

const LOCAL_CONFIG: &str = "weft.toml";

fn main() {
    let matches = Command::new("weft")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Parse markup, style and script files, nested regions included")
        .arg_required_else_help(true)
        .arg(
            Arg::new("path")
                .help("Path to the file")
                .required_unless_present("list-formats")
                .index(1),
        )
        .arg(
            Arg::new("tpl")
                .long("tpl")
                .help("Treat the file as a markup template")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("TOML file layered over the built-in defaults"),
        )
        .arg(
            Arg::new("tpl-ld")
                .long("tpl-ld")
                .help("Template left delimiter"),
        )
        .arg(
            Arg::new("tpl-rd")
                .long("tpl-rd")
                .help("Template right delimiter"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .help("Output format (text, json, treeviz)")
                .default_value("treeviz"),
        )
        .arg(
            Arg::new("list-formats")
                .long("list-formats")
                .help("List available output formats")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("WEFT_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let formats = FormatRegistry::default();

    if matches.get_flag("list-formats") {
        handle_list_formats_command(&formats);
        return;
    }

    let path = matches
        .get_one::<String>("path")
        .expect("path is required unless listing formats");
    let format = matches
        .get_one::<String>("format")
        .expect("format has a default");
    let config = matches.get_one::<String>("config");
    let overrides: Vec<(&str, &str)> = [("tpl.ld", "tpl-ld"), ("tpl.rd", "tpl-rd")]
        .into_iter()
        .filter_map(|(key, arg)| matches.get_one::<String>(arg).map(|v| (key, v.as_str())))
        .collect();

    if let Err(message) = handle_parse_command(
        path,
        matches.get_flag("tpl"),
        config.map(String::as_str),
        &overrides,
        format,
        &formats,
    ) {
        eprintln!("Error: {}", message);
        std::process::exit(1);
    }
}

/// Handle the parse command
fn handle_parse_command(
    path: &str,
    tpl: bool,
    config: Option<&str>,
    overrides: &[(&str, &str)],
    format: &str,
    formats: &FormatRegistry,
) -> Result<(), String> {
    let mut loader = Loader::new().with_optional_file(LOCAL_CONFIG);
    if let Some(config) = config {
        loader = loader.with_file(config);
    }
    for (key, value) in overrides {
        loader = loader
            .set_override(key, *value)
            .map_err(|e| weft::Error::from(e).to_string())?;
    }
    let config = loader.build().map_err(|e| weft::Error::from(e).to_string())?;

    let content = std::fs::read_to_string(path).map_err(|e| weft::Error::from(e).to_string())?;
    let mut file = SourceFile::new(path);
    if tpl {
        file = file.template();
    }

    tracing::debug!(path, bytes = content.len(), "parsing");
    let ast = parse_to_ast(&content, &file, &config).map_err(|e| e.to_string())?;
    let output = formats.serialize(&ast, format).map_err(|e| {
        format!("{}\nAvailable formats: {}", e, formats.list_formats().join(", "))
    })?;

    print!("{}", output);
    Ok(())
}

/// Handle the list-formats command
fn handle_list_formats_command(formats: &FormatRegistry) {
    println!("Available formats:\n");

    for name in formats.list_formats() {
        if let Some(formatter) = formats.get(&name) {
            println!("  {}", name);
            println!("    {}", formatter.description());
            println!();
        }
    }
}
