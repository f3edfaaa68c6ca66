use anyhow::{bail, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;

use draw_and_tell::media::tone_frames;
use draw_and_tell::{
    Config, ConsentRecord, ConsentStore, HttpGateway, InferenceGateway, NullSink, ParentClient,
    ScriptedMedia, SessionFlow, Stage,
};

/// Tiny placeholder drawing used by the demo session (1x1 PNG)
const DEMO_IMAGE_B64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

#[derive(Parser)]
#[command(name = "draw-and-tell", about = "Guided drawing session client")]
struct Cli {
    /// Config file (without extension), loaded via the config crate
    #[arg(long, default_value = "config/draw-and-tell")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record parental consent (valid 30 days)
    Consent {
        #[arg(long)]
        parent_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        child_age: u8,
    },
    /// Fetch one drawing prompt
    Prompt,
    /// Drive a full session against a live service with scripted devices
    Demo,
    /// List past sessions (parent view)
    Sessions,
    /// Show one session with its drawings (parent view)
    Session { id: i64 },
    /// Show the auto-generated recap for one session (parent view)
    Recap { id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::load_or_default(&cli.config);

    match cli.command {
        Command::Consent {
            parent_name,
            email,
            child_age,
        } => {
            let store = ConsentStore::new(&config.consent.record_path);
            let record = ConsentRecord::new(parent_name, email, child_age);
            store.save(&record)?;
            println!("Consent recorded until {}", record.expires_at());
        }

        Command::Prompt => {
            require_consent(&config)?;
            let gateway = HttpGateway::new(config.service.base_url.clone());
            let reply = gateway.get_prompt().await?;
            println!("{}", reply.prompt);
        }

        Command::Demo => {
            require_consent(&config)?;
            run_demo(&config).await?;
        }

        Command::Sessions => {
            let parent = ParentClient::new(config.service.base_url.clone());
            for session in parent.list_sessions().await? {
                println!("{}  {}  {}", session.id, session.timestamp, session.prompt);
            }
        }

        Command::Session { id } => {
            let parent = ParentClient::new(config.service.base_url.clone());
            let detail = parent.session(id).await?;
            println!("{}  {}", detail.timestamp, detail.prompt);
            for drawing in detail.drawings {
                println!("  #{}: {} [{}]", drawing.id, drawing.caption, drawing.tags.join(", "));
            }
        }

        Command::Recap { id } => {
            let parent = ParentClient::new(config.service.base_url.clone());
            let recap = parent.recap(id).await?;
            println!("Prompt: {}", recap.prompt);
            println!("Drawings: {}", recap.num_drawings);
            println!("Skills: {}", recap.skills.join(", "));
            println!("Top tags: {}", recap.top_tags.join(", "));
            println!("{}", recap.highlights);
        }
    }

    Ok(())
}

fn require_consent(config: &Config) -> Result<()> {
    let store = ConsentStore::new(&config.consent.record_path);
    match store.load()? {
        Some(record) => {
            info!("Consent on file for {} until {}", record.parent_name, record.expires_at());
            Ok(())
        }
        None => bail!(
            "No valid parental consent on file; run `draw-and-tell consent` first"
        ),
    }
}

/// Walk the whole state machine once: scripted camera/microphone stand in
/// for real devices, the inference service is live.
async fn run_demo(config: &Config) -> Result<()> {
    let media = Arc::new(ScriptedMedia::new());
    media.set_image(BASE64.decode(DEMO_IMAGE_B64)?);
    media.set_frames(tone_frames(1500, config.audio.sample_rate));

    let gateway = Arc::new(HttpGateway::new(config.service.base_url.clone()));
    let mut flow = SessionFlow::new(
        gateway,
        media,
        Arc::new(NullSink),
        config.audio.clone(),
    );

    flow.fetch_prompt().await;
    let prompt = match &flow.session().prompt {
        Some(prompt) => prompt.clone(),
        None => bail!("No prompt available, cannot start the session"),
    };
    println!("Prompt: {}", prompt);

    flow.start_drawing();
    if flow.capture_drawing().await != Stage::AwaitingAnswer {
        report_and_bail(&flow, "drawing analysis")?;
    }
    println!(
        "Question: {}",
        flow.session().question_text.as_deref().unwrap_or("(none)")
    );

    if flow.begin_answer().await != Stage::Recording {
        report_and_bail(&flow, "recording")?;
    }
    tokio::time::sleep(std::time::Duration::from_millis(500)).await;

    match flow.finish_answer().await {
        Stage::Responding => {
            println!(
                "Response: {}",
                flow.session().response_text.as_deref().unwrap_or("(none)")
            );
            flow.acknowledge_response();
        }
        Stage::Finished => println!("No follow-up generated."),
        _ => report_and_bail(&flow, "answer submission")?,
    }

    flow.drain_playback_events();
    println!("Session finished: {}", flow.stage());
    Ok(())
}

fn report_and_bail(flow: &SessionFlow, step: &str) -> Result<()> {
    match &flow.session().last_error {
        Some(e) => bail!("Demo stopped during {}: {}", step, e.message),
        None => bail!("Demo stopped during {} in stage {}", step, flow.stage()),
    }
}
