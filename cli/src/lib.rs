use anyhow::{anyhow, Error, Result};
use clap::{Parser, Subcommand};
use graphstore::io::{self, FormatRegistry};
use graphstore::{AccessMode, GraphStore, GraphStoreOptions, IndexOrder, PrefixMapping, Term};
use log::info;
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "graphstore")]
#[command(about = "Embedded RDF triple store")]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Verbose mode - sets the RUST_LOG level to info, defaults to warning level
    #[clap(long, short, action, default_value = "false", global = true)]
    verbose: bool,
    /// Debug mode - sets the RUST_LOG level to debug, defaults to warning level
    #[clap(long, action, default_value = "false", global = true)]
    debug: bool,
    /// Neither write nor query the POS index
    #[clap(long, action, default_value = "false", global = true)]
    disable_pos_index: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Load an RDF document into a store, creating the store if needed
    Load {
        /// Store directory
        store: PathBuf,
        /// RDF document to load
        file: PathBuf,
        /// Document format: one of [nt, ttl, xml]. Guessed from the extension, defaults to nt
        #[clap(long, short)]
        format: Option<String>,
        /// Base IRI for relative IRIs in Turtle and RDF/XML documents
        #[clap(long)]
        base: Option<String>,
    },
    /// Serialize the whole store
    Dump {
        /// Store directory
        store: PathBuf,
        /// Serialization format: one of [nt, ttl, jsonld, jsonld-frame, xml, csv]
        #[clap(long, short, default_value = "nt")]
        format: String,
        /// Extra namespace prefix as PREFIX=URI; may be repeated
        #[clap(long = "prefix", short = 'p', value_parser = parse_prefix)]
        prefixes: Vec<(String, String)>,
        /// Do not start from the rdf, rdfs, owl and xsd prefixes
        #[clap(long, action, default_value = "false")]
        no_default_prefixes: bool,
        /// Output file path; if omitted, writes to STDOUT
        #[clap(long, short)]
        output: Option<PathBuf>,
    },
    /// Print the triples whose index key starts with the given canonical terms
    Query {
        /// Store directory
        store: PathBuf,
        /// Scan the POS index, keys in predicate, object, subject order
        #[clap(long, action, default_value = "false")]
        pos: bool,
        /// Up to three leading terms in N-Triples syntax, e.g. '<http://ex.org/s>'
        keys: Vec<String>,
    },
    /// Compact both indexes
    Compact {
        /// Store directory
        store: PathBuf,
    },
    /// Print the number of records in each index
    Stats {
        /// Store directory
        store: PathBuf,
        /// Output JSON instead of text
        #[clap(long, action, default_value = "false")]
        json: bool,
    },
    /// List the registered loader and serializer formats
    Formats,
    /// Prints the version of the graphstore binary
    Version,
}

fn parse_prefix(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((prefix, uri)) if !uri.is_empty() => Ok((prefix.to_string(), uri.to_string())),
        _ => Err(format!("expected PREFIX=URI, got '{}'", s)),
    }
}

pub fn run() -> Result<()> {
    graphstore::init_logging();
    let cmd = Cli::parse();
    execute(cmd)
}

pub fn run_from_args<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    graphstore::init_logging();
    let cmd = Cli::try_parse_from(args).map_err(Error::from)?;
    execute(cmd)
}

fn execute(cmd: Cli) -> Result<()> {
    // RUST_LOG may already carry GRAPHSTORE_LOG; the CLI flags win over both.
    if cmd.debug {
        std::env::set_var("RUST_LOG", "debug");
    } else if cmd.verbose {
        std::env::set_var("RUST_LOG", "info");
    } else if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "warn");
    }
    let _ = env_logger::try_init();

    let options = GraphStoreOptions::builder()
        .disable_pos_index(cmd.disable_pos_index)
        .build()?;

    match cmd.command {
        Commands::Load {
            store,
            file,
            format,
            base,
        } => {
            let format = match format {
                Some(format) => format,
                None => io::format_from_extension(&file).unwrap_or("nt").to_string(),
            };
            let store = GraphStore::open(&store, options, AccessMode::ReadWrite)?;
            let mut input = BufReader::new(File::open(&file)?);
            let count = match base {
                Some(base) => {
                    let loader = match format.as_str() {
                        "ttl" => io::RdfLoader::turtle(),
                        "xml" => io::RdfLoader::rdf_xml(),
                        other => return Err(anyhow!("--base is not supported for format '{}'", other)),
                    };
                    io::Loader::load(&loader.with_base_iri(base), &store, &mut input)?
                }
                None => io::load(&store, &mut input, &format)?,
            };
            println!("Loaded {} triples from {}", count, file.display());
            store.close();
        }
        Commands::Dump {
            store,
            format,
            prefixes,
            no_default_prefixes,
            output,
        } => {
            let store = open_read_only(&store, options)?;
            let mut mapping = if no_default_prefixes {
                PrefixMapping::new()
            } else {
                PrefixMapping::with_defaults()
            };
            mapping.extend(prefixes);
            let mut out: Box<dyn Write> = match &output {
                Some(path) => Box::new(BufWriter::new(File::create(path)?)),
                None => Box::new(BufWriter::new(std::io::stdout().lock())),
            };
            io::serialize(&mut out, &store, &format, &mapping)?;
            if let Some(path) = output {
                info!("Wrote {} dump to {}", format, path.display());
            }
        }
        Commands::Query { store, pos, keys } => {
            if keys.len() > 3 {
                return Err(anyhow!("at most three keys may be given, got {}", keys.len()));
            }
            for key in &keys {
                Term::parse(key).map_err(|e| anyhow!("invalid key '{}': {}", key, e))?;
            }
            let order = if pos { IndexOrder::Pos } else { IndexOrder::Spo };
            let store = open_read_only(&store, options)?;
            let mut out = BufWriter::new(std::io::stdout().lock());
            for triplet in store.query(order, &keys)? {
                writeln!(out, "{} .", triplet?)?;
            }
            out.flush()?;
        }
        Commands::Compact { store } => {
            let store = GraphStore::open(&store, options, AccessMode::ReadWrite)?;
            store.compact()?;
            println!("Compacted {}", store.path().display());
            store.close();
        }
        Commands::Stats { store, json } => {
            let store = open_read_only(&store, options)?;
            let stats = store.stats()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("SPO records: {}", stats.spo_records);
                if cmd.disable_pos_index {
                    println!("POS records: (index disabled)");
                } else {
                    println!("POS records: {}", stats.pos_records);
                }
            }
        }
        Commands::Formats => {
            let registry = FormatRegistry::default();
            println!(
                "loaders: {}",
                registry.loader_formats().collect::<Vec<_>>().join(", ")
            );
            println!(
                "serializers: {}",
                registry.serializer_formats().collect::<Vec<_>>().join(", ")
            );
        }
        Commands::Version => {
            println!("graphstore {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

fn open_read_only(path: &Path, options: GraphStoreOptions) -> Result<GraphStore> {
    GraphStore::open_read_only(path, options)
        .map_err(|e| anyhow!("cannot open {}: {}", path.display(), e))
}
