use cds_rulebuilder::data::{
    ClinicalStatus, ConditionRecord, MedicationRecord, MedicationStatus, Observation,
    PatientContext,
};
use cds_rulebuilder::registry::vocabulary::{CONDITIONS, MEDICATIONS};
use chrono::{Datelike, NaiveDate, TimeDelta, Utc};
use clap::Parser;
use rand::Rng;
use rand::rngs::ThreadRng;
use std::fs;

/// A CLI tool to generate mock patient records for hook dry runs
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The path to write the generated JSON file to
    #[arg(short, long, default_value = "generated_patient.json")]
    output: String,

    /// The minimum number of readings to generate per measurement
    #[arg(long, default_value_t = 0)]
    min: usize,

    /// The maximum number of readings to generate per measurement
    #[arg(long, default_value_t = 6)]
    max: usize,

    /// How many days of history the readings span
    #[arg(long, default_value_t = 180)]
    days: i64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut rng = rand::rng();

    if cli.min > cli.max {
        eprintln!(
            "Error: --min ({}) cannot be greater than --max ({})",
            cli.min, cli.max
        );
        std::process::exit(1);
    }
    if cli.days < 1 {
        eprintln!("Error: --days must be at least 1");
        std::process::exit(1);
    }

    println!(
        "Generating mock patient (readings per measurement: {} to {}, over {} days)...",
        cli.min, cli.max, cli.days
    );

    let as_of = Utc::now();
    let mut patient = PatientContext::new(format!("patient-{}", rng.random_range(1000..10000)), as_of);
    let age_years = rng.random_range(18..90);
    patient.birth_date = NaiveDate::from_ymd_opt(as_of.year() - age_years, 6, 15);
    patient.gender = Some(if rng.random_bool(0.5) { "female" } else { "male" }.to_string());
    println!("-> Generated demographics ({} years).", age_years);

    let measurements: Vec<(&str, fn(&mut ThreadRng) -> f64)> = vec![
        ("HbA1c", |rng| rng.random_range(4.8..10.5)),
        ("glucose", |rng| rng.random_range(70.0..260.0)),
        ("potassium", |rng| rng.random_range(3.0..5.8)),
        ("creatinine", |rng| rng.random_range(0.6..2.4)),
        ("inr", |rng| rng.random_range(0.9..4.2)),
        ("lactate", |rng| rng.random_range(0.6..4.5)),
        ("wbc", |rng| rng.random_range(3.5..16.0)),
        ("blood-pressure.systolic", |rng| rng.random_range(100.0..185.0)),
        ("blood-pressure.diastolic", |rng| rng.random_range(60.0..110.0)),
        ("heart-rate", |rng| rng.random_range(55.0..125.0)),
        ("respiratory-rate", |rng| rng.random_range(12.0..28.0)),
        ("temperature", |rng| rng.random_range(36.0..39.5)),
    ];

    for (key, generate) in measurements {
        let count = rng.random_range(cli.min..=cli.max);
        let readings: Vec<Observation> = (0..count)
            .map(|_| Observation {
                value: round(generate(&mut rng)),
                effective: as_of - TimeDelta::hours(rng.random_range(0..cli.days * 24)),
            })
            .collect();
        if count > 0 {
            println!("-> Generated {} reading(s) of '{}'.", count, key);
            patient.observations.insert(key.to_string(), readings);
        }
    }

    for entry in CONDITIONS {
        if !rng.random_bool(f64::from(entry.frequency) / 4000.0) {
            continue;
        }
        let status = match rng.random_range(0..10) {
            0 => ClinicalStatus::Resolved,
            1 => ClinicalStatus::Inactive,
            _ => ClinicalStatus::Active,
        };
        patient.conditions.push(ConditionRecord {
            code: entry.code.to_string(),
            status,
            onset: Some(as_of - TimeDelta::days(rng.random_range(1..3650))),
            chronic: rng.random_bool(0.7),
        });
    }
    println!("-> Generated {} problem list entr(ies).", patient.conditions.len());

    for entry in MEDICATIONS {
        if !rng.random_bool(f64::from(entry.frequency) / 4000.0) {
            continue;
        }
        let started = as_of - TimeDelta::days(rng.random_range(1..1500));
        let stopped = rng.random_bool(0.2);
        patient.medications.push(MedicationRecord {
            code: entry.code.to_string(),
            status: if stopped {
                MedicationStatus::Stopped
            } else {
                MedicationStatus::Active
            },
            started: Some(started),
            stopped: stopped.then(|| as_of - TimeDelta::days(rng.random_range(0..60))),
        });
    }
    println!("-> Generated {} medication(s).", patient.medications.len());

    let json_output = serde_json::to_string_pretty(&patient)?;
    fs::write(&cli.output, json_output)?;

    println!(
        "Successfully generated and saved patient '{}' to '{}'",
        patient.patient_id, cli.output
    );

    Ok(())
}

fn round(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
