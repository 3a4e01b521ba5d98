//! ADB Agent - drive an Android device with a reasoning model
//!
//! This is the CLI entry point for the adb-agent tool.
//! Run with: cargo run --bin adb-agent -- "Open Chrome"

use adb_agent::actions::Catalog;
use adb_agent::adb::default_adb_path;
use adb_agent::agent::{AgentEvent, EventCallback};
use adb_agent::{
    AdbBridge, AdbConfig, AdbDevice, AgentConfig, AnthropicClient, AppSettings, ModelConfig,
    Outcome, PhoneAgent, SessionReport, ToolOutput,
};
use anyhow::Context;
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Drive an Android device over ADB with a reasoning model
#[derive(Parser, Debug)]
#[command(name = "adb-agent", version)]
#[command(after_help = r#"Examples:
    # Run a task
    adb-agent "Open Chrome and search for the weather"

    # Interactive mode
    adb-agent

    # Pick a device and allow every device action
    adb-agent --serial emulator-5554 --full-tools "Turn on airplane mode"

    # Show the actions offered to the model
    adb-agent --list-tools
"#)]
struct Cli {
    /// Task to run; prompts interactively when omitted
    task: Vec<String>,

    /// Maximum agent steps
    #[arg(long, env = "ADB_AGENT_STEPS")]
    steps: Option<u32>,

    /// Model name
    #[arg(long, env = "ADB_AGENT_MODEL")]
    model: Option<String>,

    /// Messages API base URL
    #[arg(long, env = "ANTHROPIC_BASE_URL")]
    base_url: Option<String>,

    /// API key
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true, hide = true)]
    api_key: Option<String>,

    /// Maximum output tokens per model call
    #[arg(long)]
    max_tokens: Option<u32>,

    /// ADB device serial
    #[arg(short = 's', long, env = "ADB_SERIAL")]
    serial: Option<String>,

    /// Path to the adb executable
    #[arg(long, env = "ADB_PATH")]
    adb_path: Option<String>,

    /// Send only the newest N screenshots to the model
    #[arg(long, value_name = "N")]
    keep_screenshots: Option<usize>,

    /// Offer every device action to the model, not just the basic set
    #[arg(long)]
    full_tools: bool,

    /// Print the offered actions as JSON and exit
    #[arg(long)]
    list_tools: bool,

    /// Print device information and exit
    #[arg(long)]
    device_info: bool,

    /// Save the effective settings (without the API key)
    #[arg(long)]
    save_settings: bool,

    /// Only print the final result
    #[arg(short = 'q', long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let stored = AppSettings::load().unwrap_or_else(|e| {
        warn!("Ignoring stored settings: {}", e);
        AppSettings::default()
    });
    let settings = effective_settings(&cli, stored);

    if cli.save_settings {
        let path = settings.save()?;
        println!("💾 Settings saved to {}", path.display());
        if cli.task.is_empty() && !cli.list_tools && !cli.device_info {
            return Ok(());
        }
    }

    let catalog = if settings.full_tools {
        Catalog::FULL
    } else {
        Catalog::AGENT
    };

    if cli.list_tools {
        println!("{}", serde_json::to_string_pretty(&catalog.descriptors())?);
        return Ok(());
    }

    let adb_config = AdbConfig::new(
        settings
            .adb_path()
            .map(str::to_string)
            .unwrap_or_else(default_adb_path),
        settings.serial().map(str::to_string),
    );
    let device = AdbDevice::new(
        Arc::new(AdbBridge::new(adb_config.clone())),
        adb_config.serial.clone(),
    );

    if cli.device_info {
        let report = device.get_device_info().await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let api_key = cli.api_key.clone().unwrap_or_default();
    let model_config = ModelConfig::default()
        .with_base_url(&settings.base_url)
        .with_api_key(api_key)
        .with_model_name(&settings.model_name)
        .with_max_tokens(settings.max_tokens)
        .with_max_retries(settings.max_retries)
        .with_retry_delay(settings.retry_delay);
    let oracle = AnthropicClient::new(model_config).context("Cannot create model client")?;

    let mut agent_config = AgentConfig::default()
        .with_max_steps(settings.max_steps)
        .with_catalog(catalog);
    if let Some(keep) = settings.keep_screenshots {
        agent_config = agent_config.with_keep_screenshots(keep);
    }

    if !cli.quiet {
        println!("🤖 ADB Agent - Android automation");
        println!("================================================");
        println!("Model: {} @ {}", settings.model_name, settings.base_url);
        println!("ADB: {}", adb_config.adb_path);
        if let Some(serial) = &adb_config.serial {
            println!("Device: {}", serial);
        }
        println!(
            "Steps: {} | Tools: {} actions",
            settings.max_steps,
            catalog.len()
        );
        println!("================================================\n");
    }

    let mut agent = PhoneAgent::new(Arc::new(oracle), device, agent_config);
    if !cli.quiet {
        agent = agent.with_event_callback(progress_printer());
    }

    if !cli.task.is_empty() {
        let task = cli.task.join(" ");
        println!("📝 Task: {}\n", task);
        let report = agent.run(&task).await?;
        print_report(&report);
        return Ok(());
    }

    // Interactive mode
    println!("Interactive mode. Type your task and press Enter.");
    println!("Type 'quit' or 'exit' to exit.\n");

    let stdin = io::stdin();
    loop {
        print!("📝 Task: ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let task = line.trim();

        if task.is_empty() {
            continue;
        }
        if task == "quit" || task == "exit" {
            println!("Goodbye! 👋");
            break;
        }

        match agent.run(task).await {
            Ok(report) => print_report(&report),
            Err(e) => eprintln!("\n❌ Error: {}\n", e),
        }
    }

    Ok(())
}

/// Layer CLI flags and environment over the stored settings.
fn effective_settings(cli: &Cli, stored: AppSettings) -> AppSettings {
    let mut settings = stored;
    if let Some(steps) = cli.steps {
        settings.max_steps = steps;
    }
    if let Some(model) = &cli.model {
        settings.model_name = model.clone();
    }
    if let Some(base_url) = &cli.base_url {
        settings.base_url = base_url.clone();
    }
    if let Some(max_tokens) = cli.max_tokens {
        settings.max_tokens = max_tokens;
    }
    if let Some(serial) = &cli.serial {
        settings.serial = serial.clone();
    }
    if let Some(adb_path) = &cli.adb_path {
        settings.adb_path = adb_path.clone();
    }
    if cli.keep_screenshots.is_some() {
        settings.keep_screenshots = cli.keep_screenshots;
    }
    if cli.full_tools {
        settings.full_tools = true;
    }
    settings
}

fn progress_printer() -> EventCallback {
    Box::new(|event: &AgentEvent<'_>| match event {
        AgentEvent::Started { session } => {
            let assumed = if session.device.assumed_screen {
                " (assumed)"
            } else {
                ""
            };
            println!(
                "📱 Connected: {} | Screen: {}{}",
                session.device.serial, session.device.screen, assumed
            );
        }
        AgentEvent::StepStarted { step, max_steps } => {
            println!("\n{}", "=".repeat(50));
            println!("🔄 Step {}/{}", step, max_steps);
        }
        AgentEvent::OracleReplied {
            elapsed, usage, ..
        } => {
            let tokens = usage.map(|u| u.total()).unwrap_or_default();
            println!("   API: {}ms | tokens: +{}", elapsed.as_millis(), tokens);
        }
        AgentEvent::Commentary { text } => {
            println!("💭 {}", text);
        }
        AgentEvent::ActionStarted { invocation } => {
            println!("🎯 {} {}", invocation.name, invocation.describe_arguments());
        }
        AgentEvent::ActionFinished { result, elapsed } => {
            if result.is_error {
                println!("   ❌ {} ({}ms)", result.output.summary(), elapsed.as_millis());
            } else {
                let detail = match &result.output {
                    ToolOutput::Image(_) => String::new(),
                    ToolOutput::Text(_) => format!("{} ", result.output.summary()),
                };
                println!("   ✅ {}({}ms)", detail, elapsed.as_millis());
            }
        }
        AgentEvent::Finished { .. } => {}
    })
}

fn print_report(report: &SessionReport) {
    match &report.outcome {
        Outcome::Done { summary } => {
            println!("\n🎉 {}", "=".repeat(48));
            println!("✅ Task complete: {}", summary);
        }
        Outcome::EndedTurn { .. } => {
            println!("\n✅ Result: {}", report.message());
        }
        Outcome::BudgetExhausted { .. } => {
            println!("\n⚠️  {}", report.message());
        }
    }
    println!(
        "   {:.1}s total | {} steps | {} tokens\n",
        report.elapsed.as_secs_f64(),
        report.steps(),
        report.usage().total()
    );
}
