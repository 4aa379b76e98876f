use cds_rulebuilder::catalog::{CatalogSearch, RegistryCatalog};
use cds_rulebuilder::config::BuilderConfig;
use cds_rulebuilder::hook::template;
use cds_rulebuilder::prelude::*;
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Domain names accepted on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum DomainCli {
    Demographic,
    Condition,
    Lab,
    Vital,
    Medication,
}

impl From<DomainCli> for Domain {
    fn from(value: DomainCli) -> Self {
        match value {
            DomainCli::Demographic => Domain::Demographic,
            DomainCli::Condition => Domain::MedicalCondition,
            DomainCli::Lab => Domain::LabValue,
            DomainCli::Vital => Domain::VitalSign,
            DomainCli::Medication => Domain::Medication,
        }
    }
}

/// Author, compile and dry-run clinical decision support hooks
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Optional path to a builder configuration JSON file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a draft JSON file into a canonical hook definition
    Compile {
        draft_path: String,
        /// Where to write the hook definition; printed to stdout when omitted
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Load a hook definition and show its condition tree
    Parse {
        hook_path: String,
        /// Print the editable draft as JSON instead of a tree
        #[arg(long)]
        json: bool,
    },
    /// List every problem in a draft JSON file
    Validate { draft_path: String },
    /// Dry-run a hook definition against a patient record
    Eval {
        hook_path: String,
        /// Patient JSON file; the built-in mock patient is used when omitted
        patient_path: Option<String>,
    },
    /// List the built-in templates, or write one out as a draft
    Template {
        id: Option<String>,
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Search the field catalog of a domain
    Search {
        #[arg(value_enum)]
        domain: DomainCli,
        term: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => BuilderConfig::from_file(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to load config: {}", e))),
        None => BuilderConfig::default(),
    };
    let mut builder = HookCompiler::builder();
    if let Some(author) = &config.default_author {
        builder = builder.with_default_author(author.clone());
    }
    let compiler = builder.build();

    match cli.command {
        Command::Compile { draft_path, output } => {
            run_compile(&compiler, &config, &draft_path, output.as_deref())
        }
        Command::Parse { hook_path, json } => run_parse(&compiler, &hook_path, json),
        Command::Validate { draft_path } => run_validate(&compiler, &config, &draft_path),
        Command::Eval {
            hook_path,
            patient_path,
        } => run_eval(&compiler, &hook_path, patient_path.as_deref()),
        Command::Template { id, output } => run_template(id.as_deref(), output.as_deref()),
        Command::Search { domain, term } => run_search(&compiler, &config, domain.into(), &term),
    }
}

fn read_file(path: &str, what: &str) -> String {
    fs::read_to_string(path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to read {} '{}': {}", what, path, e)))
}

fn load_draft(path: &str) -> HookDraft {
    let json = read_file(path, "draft file");
    serde_json::from_str(&json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse draft JSON: {}", e)))
}

fn write_or_print(json: &str, output: Option<&str>) {
    match output {
        Some(path) => {
            fs::write(path, json)
                .unwrap_or_else(|e| exit_with_error(&format!("Failed to write '{}': {}", path, e)));
            println!("  -> Wrote '{}'", path);
        }
        None => println!("{}", json),
    }
}

fn run_compile(compiler: &HookCompiler, config: &BuilderConfig, draft_path: &str, output: Option<&str>) {
    let draft = load_draft(draft_path);
    let report = validate_draft(&draft, compiler.registry(), &config.editor);
    for issue in report.warnings() {
        eprintln!("{}", issue);
    }

    let start = Instant::now();
    let definition = compiler
        .compile_hook(&draft)
        .unwrap_or_else(|e| exit_with_error(&format!("Compilation failed: {}", e)));
    let json = definition
        .to_json_pretty()
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to serialize hook: {}", e)));
    write_or_print(&json, output);
    eprintln!(
        "Compiled '{}' (version {}) in {:?}",
        definition.id,
        definition.meta.version,
        start.elapsed()
    );
}

fn run_parse(compiler: &HookCompiler, hook_path: &str, as_json: bool) {
    let json = read_file(hook_path, "hook file");
    let draft = compiler
        .parse_hook_json(&json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse hook: {}", e)));
    if as_json {
        let out = serde_json::to_string_pretty(&draft)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to serialize draft: {}", e)));
        println!("{}", out);
        return;
    }
    println!("{} [{}]", draft.title, draft.trigger);
    print!("{}", DisplayTree::new(&draft.tree));
    println!("Cards: {}", draft.cards.len());
}

fn run_validate(compiler: &HookCompiler, config: &BuilderConfig, draft_path: &str) {
    let draft = load_draft(draft_path);
    let report = validate_draft(&draft, compiler.registry(), &config.editor);
    if report.is_clean() {
        println!("No issues found.");
        return;
    }
    for issue in &report.issues {
        println!("{}", issue);
    }
    if !report.can_save() {
        std::process::exit(1);
    }
}

fn run_eval(compiler: &HookCompiler, hook_path: &str, patient_path: Option<&str>) {
    let json = read_file(hook_path, "hook file");
    let definition: HookDefinition = serde_json::from_str(&json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse hook JSON: {}", e)));
    compiler
        .ensure_compiled(&definition)
        .unwrap_or_else(|e| exit_with_error(&format!("Hook is not in compiled form: {}", e)));

    let patient = match patient_path {
        Some(path) => PatientContext::from_file(path).unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to load patient from '{}': {}", path, e))
        }),
        None => {
            println!("No patient file provided. Using default mock patient.");
            PatientContext::default()
        }
    };

    let start = Instant::now();
    let result = Evaluator::new(compiler.registry())
        .evaluate_compiled(&definition.conditions, &patient)
        .unwrap_or_else(|e| exit_with_error(&format!("Evaluation failed: {}", e)));
    let duration = start.elapsed();

    println!("\nEvaluation Finished!");
    if result.matched {
        println!("  -> Hook '{}' fires for '{}'", definition.id, patient.patient_id);
        for card in &definition.cards {
            println!("     [{:?}] {}", card.indicator, card.summary);
        }
    } else {
        println!("  -> Hook '{}' does not fire for '{}'", definition.id, patient.patient_id);
    }
    println!("  -> Reason: {}", result.reason);
    println!("  -> Evaluated in {:?}", duration);
}

fn run_template(id: Option<&str>, output: Option<&str>) {
    let Some(id) = id else {
        for t in template::TEMPLATES {
            println!("{:<22} {:<22} {}", t.id, t.trigger.as_str(), t.description);
        }
        return;
    };
    let template = template::find(id)
        .unwrap_or_else(|| exit_with_error(&format!("Unknown template '{}'", id)));
    let draft = template.apply(&HookDraft::default());
    let json = serde_json::to_string_pretty(&draft)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to serialize draft: {}", e)));
    write_or_print(&json, output);
}

fn run_search(compiler: &HookCompiler, config: &BuilderConfig, domain: Domain, term: &str) {
    let catalog = RegistryCatalog::new(compiler.registry()).with_min_chars(config.search.min_chars);
    let results = catalog
        .search(term, domain)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));
    if results.is_empty() {
        println!("No matches for '{}' in {}", term, domain);
    }
    for candidate in results {
        println!("{:<28} {}", candidate.code, candidate.display);
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
