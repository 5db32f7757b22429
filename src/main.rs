use clap::Parser;
use std::collections::BTreeMap;
use std::env;
use std::error::Error;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use xtract::{ExecutionResult, ExtractXpath, MemoryContext, MessageContext, Properties};

/// Extract values from an XML file with XPath expressions.
///
/// Example: xtract order.xml -p xmlns:tx=urn:tx -p 'xpath:type=/tx:order/@type'
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// XML document to read as the message content
    xml_file: PathBuf,

    /// Step property as key=value (repeatable)
    #[arg(short = 'p', long = "property", value_parser = parse_key_val)]
    properties: Vec<(String, String)>,

    /// JSON object of step properties, applied before any --property
    #[arg(long = "properties")]
    properties_file: Option<PathBuf>,

    /// Pipeline variable as name=value (repeatable)
    #[arg(long = "var", value_parser = parse_key_val)]
    variables: Vec<(String, String)>,

    /// Set the step's debug property
    #[arg(long, default_value_t = false)]
    debug: bool,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", s))
}

/// Forwards to the pipeline context while remembering what the step wrote.
struct Recorder<'c> {
    inner: &'c mut MemoryContext,
    written: BTreeMap<String, String>,
}

impl MessageContext for Recorder<'_> {
    fn variable(&self, name: &str) -> Option<String> {
        self.inner.variable(name)
    }

    fn set_variable(&mut self, name: &str, value: String) {
        self.written.insert(name.to_string(), value.clone());
        self.inner.set_variable(name, value);
    }

    fn message_content(&self) -> io::Result<String> {
        self.inner.message_content()
    }
}

fn main() -> Result<ExitCode, Box<dyn Error>> {
    if env::var("RUST_LOG").is_err() {
        unsafe {
            env::set_var("RUST_LOG", "xtract=info");
        }
    }
    env_logger::init();

    let args = Args::parse();

    let mut properties = match &args.properties_file {
        Some(path) => Properties::from_json(&fs::read_to_string(path)?)?,
        None => Properties::new(),
    };
    for (key, value) in args.properties {
        properties.insert(key, value);
    }
    if args.debug {
        properties.insert("debug", "true");
    }

    let mut ctx = MemoryContext::new().with_content(fs::read_to_string(&args.xml_file)?);
    for (name, value) in args.variables {
        ctx.set_variable(&name, value);
    }

    let step = ExtractXpath::new(properties);
    let mut recorder = Recorder {
        inner: &mut ctx,
        written: BTreeMap::new(),
    };
    let result = step.execute(&mut recorder);

    for (name, value) in &recorder.written {
        println!("{} = {}", name, value);
    }
    log::info!("Outcome: {}", result);

    Ok(match result {
        ExecutionResult::Success => ExitCode::SUCCESS,
        ExecutionResult::Abort => ExitCode::FAILURE,
    })
}
