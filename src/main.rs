use cds_rulebuilder::data::PatientContext;
use cds_rulebuilder::execution::{DryRunExecutor, test_hook};
use cds_rulebuilder::hook::{HookDraft, HookTrigger, template};
use cds_rulebuilder::model::DisplayTree;
use cds_rulebuilder::validation::validate_draft;
use cds_rulebuilder::{compiler::HookCompiler, config::BuilderConfig};
use std::env;
use std::fs;

fn main() {
    // Create output directory
    const TMP_DIR: &str = "tmp";
    if let Err(e) = fs::create_dir_all(TMP_DIR) {
        eprintln!("Failed to create tmp directory: {}", e);
        std::process::exit(1);
    }
    println!("Created output directory at '{}'", TMP_DIR);

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    if args.len() > 3 {
        eprintln!("Usage: cargo run -- [template-id] [path/to/patient.json]");
        std::process::exit(1);
    }

    let template_id = args.get(1).map(String::as_str).unwrap_or("diabetes-monitoring");
    let patient_path = args.get(2);

    let Some(template) = template::find(template_id) else {
        eprintln!("Unknown template '{}'. Available templates:", template_id);
        for t in template::TEMPLATES {
            eprintln!("  - {:<22} {}", t.id, t.name);
        }
        std::process::exit(1);
    };
    println!("Using template: {} ({})", template.name, template.id);

    // Load patient
    let patient = if let Some(path) = patient_path {
        println!("Loading patient from: {}", path);
        match PatientContext::from_file(path) {
            Ok(patient) => patient,
            Err(e) => {
                eprintln!("Failed to load patient from '{}': {}", path, e);
                std::process::exit(1);
            }
        }
    } else {
        println!("No patient file provided. Using default mock patient.");
        PatientContext::default()
    };

    // Authoring phase
    let config = BuilderConfig::default();
    let compiler = HookCompiler::builder().with_default_author("hook-demo").build();
    let draft = template.apply(&HookDraft::new("", HookTrigger::PatientView));

    println!("\nCondition tree:");
    print!("{}", DisplayTree::new(&draft.tree).without_ids());

    let report = validate_draft(&draft, compiler.registry(), &config.editor);
    for issue in report.issues.iter() {
        println!("  -> {}", issue);
    }
    if !report.can_save() {
        eprintln!("Draft has {} blocking issue(s).", report.errors().count());
        std::process::exit(1);
    }

    // Compilation phase
    println!("\nCompiling hook...");
    let definition = match compiler.compile_hook(&draft) {
        Ok(definition) => definition,
        Err(e) => {
            eprintln!("Compilation failed: {}", e);
            std::process::exit(1);
        }
    };

    let json = match definition.to_json_pretty() {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Failed to serialize hook definition: {}", e);
            std::process::exit(1);
        }
    };
    let hook_path = format!("{}/{}.json", TMP_DIR, definition.id);
    if let Err(e) = fs::write(&hook_path, &json) {
        eprintln!("Failed to write hook definition: {}", e);
        std::process::exit(1);
    }
    println!("  -> Wrote hook definition to '{}'", hook_path);
    println!(
        "Compilation Successful! {} top-level condition(s), {} card(s), {} prefetch quer(ies).",
        definition.conditions.len(),
        definition.cards.len(),
        definition.prefetch.len()
    );

    // Dry run phase
    println!("\nRunning dry run for patient '{}'", patient.patient_id);
    let patient_id = patient.patient_id.clone();
    let executor = DryRunExecutor::new(compiler.clone()).with_patient(patient);
    let response = match test_hook(&executor, &compiler, &definition, &patient_id) {
        Ok(response) => response,
        Err(e) => {
            eprintln!("Dry run failed: {}", e);
            std::process::exit(1);
        }
    };

    println!("\nDry Run Finished!");
    if response.cards.is_empty() {
        println!("  -> Hook did not fire");
    } else {
        for card in &response.cards {
            println!("  -> [{:?}] {}", card.indicator, card.summary);
        }
    }
    if let Some(reason) = response.prefetch_result.get("reason").and_then(|r| r.as_str()) {
        println!("  -> Reason: {}", reason);
    }
    println!();
}
