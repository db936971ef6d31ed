mod commands;

use anyhow::Context;
use api_client::{ClientConfig, HttpRecordsApi};
use clap::{Parser, ValueEnum};
use domain::{
    catalog::{Route, ALLERGY_SUBSTANCES, PRESCRIPTION_MEDICATIONS},
    prescriptions::{DuplicatePolicy, PrescriptionPanel, SubmitOutcome},
    RecordsApi,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use commands::{check_value, parse_line, ConsoleCommand, HELP};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyArg {
    SameDrug,
    SameDrugAndDose,
    Disabled,
}

impl From<PolicyArg> for DuplicatePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::SameDrug => DuplicatePolicy::SameDrug,
            PolicyArg::SameDrugAndDose => DuplicatePolicy::SameDrugAndDose,
            PolicyArg::Disabled => DuplicatePolicy::Disabled,
        }
    }
}

/// Prescription panel for one patient, driven from the terminal.
#[derive(Parser, Debug)]
#[command(name = "console", version)]
struct Args {
    #[arg(long, env = "UPM_PATIENT_ID")]
    patient_id: i64,

    #[arg(long, env = "UPM_PROVIDER_ID", default_value_t = 1)]
    provider_id: i64,

    /// Local guard against re-prescribing a drug already on the list
    #[arg(long, value_enum, default_value = "same-drug")]
    duplicate_policy: PolicyArg,
}

type Input = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let args = Args::parse();
    let config = ClientConfig::from_env().context("loading API configuration")?;
    let api = HttpRecordsApi::new(config).context("building HTTP client")?;

    match api.health().await {
        Ok(true) => tracing::info!("API connected at {}", api.config().base_url),
        Ok(false) => tracing::warn!("API at {} reports unhealthy", api.config().base_url),
        Err(e) => tracing::warn!("API check failed: {}", e),
    }

    let mut panel = PrescriptionPanel::new(api, args.patient_id, args.provider_id)
        .with_duplicate_policy(args.duplicate_policy.into());

    println!("Patient #{}", panel.patient_id());
    if let Err(e) = panel.load().await {
        println!("Error: {e}");
    }
    print!("{}", panel.view());
    println!("Type `help` for commands.");

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = input.next_line().await.context("reading input")? {
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };

        if command == ConsoleCommand::Quit {
            break;
        }
        run(&mut panel, command, &mut input).await?;
    }

    Ok(())
}

async fn run<A: RecordsApi>(
    panel: &mut PrescriptionPanel<A>,
    command: ConsoleCommand,
    input: &mut Input,
) -> anyhow::Result<()> {
    let result = match command {
        ConsoleCommand::Open => panel.open_form().await,
        ConsoleCommand::Set(field, value) => {
            let (value, note) = check_value(field, value);
            if let Some(note) = note {
                println!("{note}");
            }
            panel.set_field(field, value).await
        }
        ConsoleCommand::Submit => report(panel.submit().await),
        ConsoleCommand::Justify(text) => panel.set_justification(text).await,
        ConsoleCommand::Override => report(panel.submit_override().await),
        ConsoleCommand::Cancel => panel.cancel().await,
        ConsoleCommand::Delete(id) => {
            println!("Delete this medication? [y/N]");
            let answer = input.next_line().await.context("reading input")?;
            if matches!(answer.as_deref().map(str::trim), Some("y" | "Y" | "yes")) {
                panel.delete_medication(id).await
            } else {
                Ok(())
            }
        }
        ConsoleCommand::Refresh => panel.load().await,
        ConsoleCommand::Allergies => {
            match panel.load_allergies().await {
                Ok(allergies) if allergies.is_empty() => println!("No allergies on record."),
                Ok(allergies) => {
                    for allergy in allergies {
                        println!("  #{} {}", allergy.id, allergy.summary());
                    }
                }
                Err(e) => println!("Error: {e}"),
            }
            return Ok(());
        }
        ConsoleCommand::Catalog => {
            println!("Medications: {}", PRESCRIPTION_MEDICATIONS.join(", "));
            let routes: Vec<&str> = Route::ALL.iter().map(Route::as_str).collect();
            println!("Routes: {}", routes.join(", "));
            println!("Allergy substances: {}", ALLERGY_SUBSTANCES.join(", "));
            return Ok(());
        }
        ConsoleCommand::History => {
            for entry in panel.journal() {
                println!("{}", serde_json::to_string(entry)?);
            }
            return Ok(());
        }
        ConsoleCommand::Help => {
            println!("{HELP}");
            return Ok(());
        }
        ConsoleCommand::Show | ConsoleCommand::Quit => Ok(()),
    };

    if let Err(e) = result {
        println!("Error: {e}");
    }
    print!("{}", panel.view());
    Ok(())
}

fn report(result: Result<SubmitOutcome, domain::Error>) -> Result<(), domain::Error> {
    match result? {
        SubmitOutcome::Accepted(prescription) => {
            println!("Saved prescription #{}", prescription.id)
        }
        SubmitOutcome::Conflicts(messages) => {
            println!(
                "{} conflict(s) reported. Enter `justify <text>` then `override`, or `cancel`.",
                messages.len()
            )
        }
    }
    Ok(())
}
