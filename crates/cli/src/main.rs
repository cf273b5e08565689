use std::io::Write as _;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use futures::StreamExt;
use uuid::Uuid;

use voyage_agents::Supervisor;
use voyage_core::{
    export_ics, format_as_text, BudgetTier, CompanionType, PlanTemplate, SlotUpdate,
    TravelSession, TravelStyle, TripDuration, TurnResponse,
};
use voyage_observability::{init_tracing, AppMetrics};
use voyage_providers::ProviderSet;

#[derive(Parser)]
#[command(name = "voyage", about = "대화형 국내 여행 일정 플래너", version)]
struct Cli {
    /// Skip all web providers and run on built-in data.
    #[arg(long, global = true)]
    offline: bool,

    /// Fixed seed for plan synthesis, useful for reproducible output.
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive planning conversation on stdin/stdout.
    Chat,
    /// Build a plan in one shot from flags and print it.
    Plan {
        /// Destination name, e.g. 제주도.
        #[arg(long)]
        destination: String,
        /// culture | nature | food | shopping | activity | photo
        #[arg(long, default_value = "nature")]
        style: String,
        /// day_trip | 1n2d | 2n3d | 3n4d | 4n5d
        #[arg(long, default_value = "2n3d")]
        duration: String,
        /// Departure date, YYYY-MM-DD. Defaults to a week from today.
        #[arg(long)]
        date: Option<String>,
        /// budget | moderate | comfortable | luxury | unlimited
        #[arg(long, default_value = "moderate")]
        budget: String,
        /// solo | couple | family | friends | group
        #[arg(long, default_value = "couple")]
        companion: String,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// simple | detailed | timeline (text output only)
        #[arg(long, default_value = "detailed")]
        template: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Ics,
}

type CliSupervisor = Supervisor<
    voyage_providers::Classifier,
    voyage_providers::Search,
    voyage_providers::MemoryCalendar,
    voyage_providers::Share,
>;

fn build_supervisor(offline: bool, seed: Option<u64>) -> CliSupervisor {
    let metrics = AppMetrics::shared();
    let providers = ProviderSet::from_env(offline, metrics.clone());
    let classifier = Arc::new(providers.classifier);
    let search = Arc::new(providers.search);
    let calendar = Arc::new(providers.calendar);
    let share = Arc::new(providers.share);
    match seed {
        Some(seed) => Supervisor::with_seed(classifier, search, calendar, share, metrics, seed),
        None => Supervisor::new(classifier, search, calendar, share, metrics),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("voyage_cli");
    let cli = Cli::parse();

    match cli.command {
        Command::Chat => chat(build_supervisor(cli.offline, cli.seed)).await,
        Command::Plan {
            destination,
            style,
            duration,
            date,
            budget,
            companion,
            format,
            template,
        } => {
            one_shot_plan(
                build_supervisor(cli.offline, cli.seed),
                &destination,
                &style,
                &duration,
                date.as_deref(),
                &budget,
                &companion,
                format,
                &template,
            )
            .await
        }
    }
}

async fn chat(supervisor: CliSupervisor) -> anyhow::Result<()> {
    let mut session = TravelSession::new(&Uuid::new_v4().to_string());
    print_response(&supervisor.welcome());

    let stdin = std::io::stdin();
    loop {
        print!("\n> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input, "exit" | "quit" | "종료") {
            break;
        }

        let streamed = supervisor.process_turn_streaming(input, &mut session).await;
        let mut chunks = streamed.chunks;
        while let Some(chunk) = chunks.next().await {
            print!("{chunk}");
            std::io::stdout().flush()?;
        }
        println!();
        print_options(&streamed.response);
    }

    println!("좋은 여행 되세요! 👋");
    Ok(())
}

fn print_response(response: &TurnResponse) {
    println!("{}", response.message);
    print_options(response);
}

fn print_options(response: &TurnResponse) {
    for (index, option) in response.options.iter().enumerate() {
        match &option.description {
            Some(description) => println!("  {}. {} — {}", index + 1, option.text, description),
            None => println!("  {}. {}", index + 1, option.text),
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn one_shot_plan(
    supervisor: CliSupervisor,
    destination: &str,
    style: &str,
    duration: &str,
    date: Option<&str>,
    budget: &str,
    companion: &str,
    format: OutputFormat,
    template: &str,
) -> anyhow::Result<()> {
    let style = TravelStyle::parse(style)
        .with_context(|| format!("unknown travel style: {style}"))?;
    let duration = TripDuration::from_token(duration)
        .with_context(|| format!("unknown duration: {duration}"))?;
    let budget =
        BudgetTier::parse(budget).with_context(|| format!("unknown budget tier: {budget}"))?;
    let companion = CompanionType::parse(companion)
        .with_context(|| format!("unknown companion type: {companion}"))?;
    let date = date
        .map(str::to_string)
        .unwrap_or_else(|| (chrono::Utc::now().date_naive() + chrono::Duration::days(7))
            .format("%Y-%m-%d")
            .to_string());

    let mut session = TravelSession::new(&Uuid::new_v4().to_string());
    session.apply_update(SlotUpdate::Destination {
        name: destination.to_string(),
    });
    session.apply_update(SlotUpdate::TravelStyle { style });
    session.apply_update(SlotUpdate::Duration { duration });
    session.apply_update(SlotUpdate::DepartureDate { date });
    session.apply_update(SlotUpdate::Budget { tier: budget });
    session.apply_update(SlotUpdate::CompanionType { companion });

    supervisor.process_turn("여행 계획 만들어줘", &mut session).await;
    let plan = session
        .travel_plan
        .context("plan generation produced no plan")?;

    match format {
        OutputFormat::Text => {
            let Some(template) = PlanTemplate::parse(template) else {
                bail!("template must be one of: simple, detailed, timeline");
            };
            println!("{}", format_as_text(&plan, template));
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
        OutputFormat::Ics => println!("{}", export_ics(&plan)),
    }
    Ok(())
}
