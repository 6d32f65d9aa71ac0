use anyhow::{bail, Context};
use clap::{value_parser, Arg, ArgMatches, Command};
use coa_governance::{ActionRequest, Gate, GateDecision, IntentContext, SessionId};
use coa_intent::IntentId;
use coa_trace::{HeuristicClassifier, MutationClassifier};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("coa-gov")
        .version(coa_governance::VERSION)
        .about("Intent governance for autonomous coding agents")
        .subcommand_required(true)
        .arg(
            Arg::new("root")
                .long("root")
                .global(true)
                .default_value(".")
                .value_parser(value_parser!(PathBuf))
                .help("Workspace root"),
        )
        .subcommand(Command::new("intents").about("List declared intents"))
        .subcommand(
            Command::new("check")
                .about("Run the pre-action gate once and print the decision as JSON")
                .arg(
                    Arg::new("tool")
                        .long("tool")
                        .required(true)
                        .help("Tool name, e.g. write_to_file"),
                )
                .arg(
                    Arg::new("intent")
                        .long("intent")
                        .help("Active intent id for the check"),
                )
                .arg(Arg::new("path").long("path").help("Direct target path"))
                .arg(
                    Arg::new("patch-file")
                        .long("patch-file")
                        .value_parser(value_parser!(PathBuf))
                        .help("Patch body to extract targets from"),
                )
                .arg(Arg::new("command").long("command").help("Shell command line")),
        )
        .subcommand(
            Command::new("classify")
                .about("Classify the change between two file versions")
                .arg(
                    Arg::new("old")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Previous version (missing file = new file)"),
                )
                .arg(
                    Arg::new("new")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("New version"),
                ),
        )
        .subcommand(
            Command::new("history")
                .about("Print recent ledger records for an intent, newest first")
                .arg(Arg::new("intent").required(true))
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .default_value("10")
                        .value_parser(value_parser!(usize)),
                ),
        )
        .subcommand(
            Command::new("context")
                .about("Render the context bundle for an intent")
                .arg(Arg::new("intent").required(true)),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("coa_governance=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    let root = matches
        .get_one::<PathBuf>("root")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."));
    let gate = Gate::from_workspace(&root)
        .with_context(|| format!("loading governance configuration under {}", root.display()))?;

    match matches.subcommand() {
        Some(("intents", _)) => list_intents(&gate).await,
        Some(("check", args)) => check(&gate, args).await,
        Some(("classify", args)) => classify(args).await,
        Some(("history", args)) => history(&gate, args).await,
        Some(("context", args)) => context(&gate, args).await,
        Some((other, _)) => bail!("unknown subcommand: {other}"),
        None => bail!("no subcommand given"),
    }
}

fn required<'a>(args: &'a ArgMatches, name: &str) -> anyhow::Result<&'a String> {
    args.get_one::<String>(name)
        .with_context(|| format!("missing <{name}>"))
}

async fn list_intents(gate: &Gate) -> anyhow::Result<()> {
    let spec = gate.spec().load().await;
    if spec.is_empty() {
        println!("no intents declared in {}", gate.spec().path().display());
        return Ok(());
    }
    for intent in spec.intents() {
        let status = intent.status.map_or("-", |s| s.as_str());
        let scope = if intent.owned_scope.is_unrestricted() {
            "(unrestricted)".to_string()
        } else {
            intent.owned_scope.patterns().join(", ")
        };
        println!("{}\t{}\t{}\t{}", intent.id, status, intent.display_name(), scope);
    }
    Ok(())
}

async fn check(gate: &Gate, args: &ArgMatches) -> anyhow::Result<()> {
    let session = SessionId::new("coa-gov");
    if let Some(intent) = args.get_one::<String>("intent") {
        gate.sessions().select(&session, IntentId::new(intent.as_str()));
    }

    let mut action = ActionRequest::new(required(args, "tool")?.as_str());
    if let Some(path) = args.get_one::<String>("path") {
        action = action.with_path(path.as_str());
    }
    if let Some(file) = args.get_one::<PathBuf>("patch-file") {
        let patch = tokio::fs::read_to_string(file)
            .await
            .with_context(|| format!("reading patch {}", file.display()))?;
        action = action.with_patch(patch);
    }
    if let Some(command) = args.get_one::<String>("command") {
        action = action.with_command(command.as_str());
    }

    let decision = gate.pre_check(&session, &action).await;
    gate.sessions().clear(&session);
    println!("{}", serde_json::to_string_pretty(&decision)?);
    std::process::exit(if matches!(decision, GateDecision::Allow) { 0 } else { 1 });
}

async fn classify(args: &ArgMatches) -> anyhow::Result<()> {
    let (Some(old), Some(new)) = (args.get_one::<PathBuf>("old"), args.get_one::<PathBuf>("new")) else {
        bail!("classify needs <old> and <new>");
    };
    let previous = tokio::fs::read_to_string(old).await.ok();
    let next = tokio::fs::read_to_string(new)
        .await
        .with_context(|| format!("reading {}", new.display()))?;

    let class = HeuristicClassifier::new().classify_path(&new.to_string_lossy(), previous.as_deref(), &next);
    println!("{class}");
    Ok(())
}

async fn history(gate: &Gate, args: &ArgMatches) -> anyhow::Result<()> {
    let intent = IntentId::new(required(args, "intent")?.as_str());
    let limit = args.get_one::<usize>("limit").copied().unwrap_or(10);
    for record in gate.ledger_reader().recent_for_intent(&intent, limit).await? {
        println!("{}", serde_json::to_string(&record)?);
    }
    Ok(())
}

async fn context(gate: &Gate, args: &ArgMatches) -> anyhow::Result<()> {
    let intent = IntentId::new(required(args, "intent")?.as_str());
    let Some(bundle) = IntentContext::load(
        gate.spec(),
        &gate.ledger_reader(),
        &intent,
        gate.config().context_history_limit,
    )
    .await
    else {
        bail!("intent '{intent}' is not declared in {}", gate.spec().path().display());
    };
    println!("{}", bundle.render());
    Ok(())
}
