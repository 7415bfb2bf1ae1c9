//! Minimal CLI: schema + JSON inputs → typed JSON
use std::path::PathBuf;
use clap::{Parser, Subcommand, Args};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// map JSON/NDJSON documents onto the records, enums and containers described by a schema document
#[derive(Parser, Debug)]
#[command(name = "json-typemap", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,

    /// log mapping decisions to stderr (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// deserialize every input and print the typed result as JSON
    Map(MapOut),
    /// load the schema and check the target type without mapping anything
    Check(CheckOut),
}

#[derive(Args, Debug, Clone)]
struct SchemaSettings {
    /// schema document (.json) declaring records, enums and handlers
    #[arg(long)]
    schema: PathBuf,

    /// target type expression, e.g. `list<Order>` (defaults to the schema's `root`)
    #[arg(long = "type")]
    ty: Option<String>,
}

#[derive(Args, Debug, Clone)]
struct MappingSettings {
    /// map the value under this top-level key when present
    #[arg(long)]
    root_element: Option<String>,

    /// strict date pattern in chrono strftime syntax (e.g. %d.%m.%Y)
    #[arg(long)]
    date_format: Option<String>,

    /// locale tag for numbers and case folding (e.g. de-DE, tr)
    #[arg(long, default_value = "invariant")]
    locale: String,

    /// fail on discriminators that name no registered subtype
    #[arg(long, default_value_t = false)]
    fail_closed: bool,
}

#[derive(clap::Parser, Debug)]
struct MapOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    #[command(flatten)]
    mapping_settings: MappingSettings,

    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————
use anyhow::{anyhow, bail, Context, Result};
use colored::Colorize;
use rayon::prelude::*;
use tracing_subscriber::EnvFilter;

use json_typemap::schema::{parse_type_expr, Schema};
use json_typemap::{Deserializer, DiscriminatorPolicy, Locale, Options, Ty};

/// One document to map: where it came from and its text.
struct Document {
    label: String,
    text: String,
}

impl SchemaSettings {
    fn load(&self, options: Options) -> Result<(Deserializer, Ty)> {
        let src = std::fs::read_to_string(&self.schema)
            .with_context(|| format!("failed to read schema {}", self.schema.display()))?;
        let schema = Schema::from_json(&src)
            .with_context(|| format!("invalid schema {}", self.schema.display()))?;
        let mut de = Deserializer::with_options(options);
        schema.apply(&mut de);
        let ty = match self.ty.as_deref() {
            Some(expr) => parse_type_expr(expr, |name| de.types().get_enum(name).is_some())?,
            None => schema
                .root
                .clone()
                .ok_or_else(|| anyhow!("no --type given and the schema declares no `root`"))?,
        };
        de.check(&ty)?;
        Ok((de, ty))
    }
}

impl MappingSettings {
    fn options(&self) -> Result<Options> {
        let locale = Locale::from_tag(&self.locale)
            .ok_or_else(|| anyhow!("unknown locale tag {:?}", self.locale))?;
        let mut options = Options::default().with_locale(locale).with_discriminators(if self.fail_closed {
            DiscriminatorPolicy::FailClosed
        } else {
            DiscriminatorPolicy::Permissive
        });
        options.root_element = self.root_element.clone();
        options.date_format = self.date_format.clone();
        Ok(options)
    }
}

impl MapOut {
    fn documents(&self) -> Result<Vec<Document>> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .map_err(|e| anyhow!("failed to resolve input file paths: {e}"))?;
        let mut out = Vec::new();
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {source_path_str}"))?;
            if self.ndjson {
                for (i, line) in source.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    out.push(Document { label: format!("{source_path_str}:{}", i + 1), text: line.to_owned() });
                }
            } else {
                out.push(Document { label: source_path_str, text: source });
            }
        }
        Ok(out)
    }

    fn run(&self, verbose: bool) -> Result<()> {
        let options = self.mapping_settings.options()?;
        let (de, ty) = self.schema_settings.load(options)?;
        let documents = self.documents()?;

        // one shared deserializer, read-only from here on
        let results: Vec<_> = documents
            .par_iter()
            .map(|doc| (doc, de.deserialize_ty(&doc.text, &ty)))
            .collect();

        let mut rendered = String::new();
        let mut failures = 0usize;
        for (doc, result) in &results {
            match result {
                Ok(value) => {
                    if verbose {
                        eprintln!("{} {}", "✓".green(), doc.label);
                    }
                    let text = if self.ndjson {
                        serde_json::to_string(value)?
                    } else {
                        serde_json::to_string_pretty(value)?
                    };
                    rendered.push_str(&text);
                    rendered.push('\n');
                }
                Err(error) => {
                    failures += 1;
                    eprintln!("{} {}: {error}", "✗".red().bold(), doc.label);
                }
            }
        }

        if let Some(out) = self.out.as_ref() {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(out, &rendered).with_context(|| format!("failed to write {}", out.display()))?;
        } else {
            print!("{rendered}");
        }

        if failures > 0 {
            bail!("{failures} of {} inputs failed", results.len());
        }
        Ok(())
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> Result<()> {
        init_tracing(self.verbose);
        match &self.cmd {
            Command::Map(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(())
                }
                target.run(self.verbose)
            }
            Command::Check(target) => {
                let (_, ty) = target.schema_settings.load(Options::default())?;
                eprintln!("{} {ty}", "✓".green());
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "json_typemap=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                matched_any = true;
                out.push(entry?);
            }
            if !matched_any {
                // an explicit glob that matched nothing is an error, not an empty run
                return Err(format!("glob pattern matched no files: {pattern}").into());
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
