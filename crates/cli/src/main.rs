use anyhow::{bail, Context};
use farkle_autoplay::{run_autoplay, write_json, write_text, AutoplayConfig, AutoplayError, Simulator};
use farkle_core::{
    ConsumableTarget, Event, EventBus, GameStatus, RollOutcome, RoundPhase, RunError, RunState,
    ScoreReport, SelectionInput,
};
use farkle_data::load_assets;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SAVE_SCHEMA_VERSION: u32 = 1;
const DEFAULT_RUN_SEED: u64 = 0xD1CE;
const DEFAULT_SAVE_PATH: &str = "farkle_save.json";

#[derive(Debug, Clone)]
struct CliOptions {
    auto: bool,
    seed: u64,
    assets: PathBuf,
    out: Option<PathBuf>,
    max_rounds: Option<u32>,
    bank_threshold: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
enum SavedAction {
    NextRound,
    Roll,
    Score {
        indices: Vec<usize>,
        #[serde(default)]
        partitioning: Option<usize>,
    },
    Bank,
    Reroll,
    Use {
        slot: usize,
        #[serde(default)]
        die: Option<usize>,
        #[serde(default)]
        face: Option<usize>,
    },
}

/// A game is saved as its seed plus every accepted action; loading replays them.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SavedGame {
    version: u32,
    seed: u64,
    actions: Vec<SavedAction>,
}

struct Session {
    run: RunState,
    events: EventBus,
    seed: u64,
    assets: PathBuf,
    actions: Vec<SavedAction>,
}

fn parse_cli_options(args: &[String]) -> anyhow::Result<CliOptions> {
    let mut options = CliOptions {
        auto: false,
        seed: DEFAULT_RUN_SEED,
        assets: PathBuf::from("assets"),
        out: None,
        max_rounds: None,
        bank_threshold: None,
    };
    let mut idx = 0usize;
    while idx < args.len() {
        let flag = args[idx].as_str();
        let value = args.get(idx + 1);
        match flag {
            "--auto" => options.auto = true,
            "--seed" | "--assets" | "--out" | "--max-rounds" | "--bank-threshold" => {
                let Some(value) = value else {
                    bail!("{flag} needs a value");
                };
                match flag {
                    "--seed" => {
                        options.seed = value.parse().with_context(|| format!("--seed {value}"))?
                    }
                    "--assets" => options.assets = PathBuf::from(value),
                    "--out" => options.out = Some(PathBuf::from(value)),
                    "--max-rounds" => {
                        options.max_rounds =
                            Some(value.parse().with_context(|| format!("--max-rounds {value}"))?)
                    }
                    _ => {
                        options.bank_threshold = Some(
                            value
                                .parse()
                                .with_context(|| format!("--bank-threshold {value}"))?,
                        )
                    }
                }
                idx += 1;
            }
            other => bail!("unknown argument '{other}'"),
        }
        idx += 1;
    }
    Ok(options)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = parse_cli_options(&args)?;
    tracing::info!(seed = options.seed, auto = options.auto, assets = %options.assets.display(), "starting");
    if options.auto {
        return run_auto(&options);
    }
    run_repl(&options)
}

fn build_run(assets: &Path, seed: u64) -> anyhow::Result<RunState> {
    let report = load_assets(assets).with_context(|| format!("load assets from {}", assets.display()))?;
    for warning in &report.warnings {
        eprintln!("warning: {warning}");
    }
    let run = RunState::new(report.config, report.content, seed).context("build run")?;
    Ok(run)
}

fn run_auto(options: &CliOptions) -> anyhow::Result<()> {
    let mut config = AutoplayConfig {
        seed: options.seed,
        ..AutoplayConfig::default()
    };
    if let Some(max_rounds) = options.max_rounds {
        config.max_rounds = max_rounds;
    }
    if let Some(threshold) = options.bank_threshold {
        config.bank_threshold = threshold;
    }
    let assets = options.assets.clone();
    let seed = options.seed;
    let factory = move || -> Result<Simulator, AutoplayError> {
        let run = build_run(&assets, seed).map_err(|err| AutoplayError::Factory(format!("{err:#}")))?;
        Ok(Simulator::new(run))
    };
    let result = run_autoplay(&factory, &config)?;
    let report = result.to_text_report();
    for line in report.lines().take(4) {
        println!("{line}");
    }
    if let Some(path) = options.out.as_ref() {
        write_json(path, &result)?;
        let text_path = path.with_extension("txt");
        write_text(&text_path, &result)?;
        println!("trace: {} {}", path.display(), text_path.display());
    }
    Ok(())
}

fn run_repl(options: &CliOptions) -> anyhow::Result<()> {
    let mut session = Session {
        run: build_run(&options.assets, options.seed)?,
        events: EventBus::default(),
        seed: options.seed,
        assets: options.assets.clone(),
        actions: Vec::new(),
    };
    println!("seed: {}", session.seed);
    print_help();
    apply_and_report(&mut session, SavedAction::NextRound);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{} > ", prompt_text(&session.run));
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");
        let args: Vec<&str> = parts.collect();
        match cmd {
            "help" | "h" | "?" => print_help(),
            "exit" => break,
            "state" | "st" => print_state(&session.run),
            "hand" => print_hand(&session.run),
            "inv" | "inventory" => print_inventory(&session.run),
            "roll" | "r" => apply_and_report(&mut session, SavedAction::Roll),
            "bank" | "b" => apply_and_report(&mut session, SavedAction::Bank),
            "reroll" | "rr" => apply_and_report(&mut session, SavedAction::Reroll),
            "next" | "n" => apply_and_report(&mut session, SavedAction::NextRound),
            "score" | "s" => match parse_selection(&args) {
                Ok(input) => apply_and_report(
                    &mut session,
                    SavedAction::Score {
                        indices: input.indices,
                        partitioning: input.partitioning,
                    },
                ),
                Err(err) => println!("error: {err}"),
            },
            "options" | "o" => match parse_selection(&args) {
                Ok(input) => print_options(&session.run, &input),
                Err(err) => println!("error: {err}"),
            },
            "use" | "u" => match parse_use_args(&args) {
                Ok((slot, die, face)) => {
                    apply_and_report(&mut session, SavedAction::Use { slot, die, face })
                }
                Err(err) => println!("error: {err}"),
            },
            "save" => {
                let path = args.first().copied().unwrap_or(DEFAULT_SAVE_PATH);
                match save_game(Path::new(path), &session) {
                    Ok(()) => println!("saved {} actions to {path}", session.actions.len()),
                    Err(err) => println!("error: {err:#}"),
                }
            }
            "load" => {
                let path = args.first().copied().unwrap_or(DEFAULT_SAVE_PATH);
                match load_game(Path::new(path), &session.assets) {
                    Ok(loaded) => {
                        session = loaded;
                        println!("loaded {path}");
                        print_state(&session.run);
                    }
                    Err(err) => println!("error: {err:#}"),
                }
            }
            "quit" | "q" => match session.run.quit(&mut session.events) {
                Ok(()) => {
                    drain_events(&mut session.events);
                    break;
                }
                Err(err) => print_run_error(&err),
            },
            other => println!("unknown command '{other}', try help"),
        }
        if session.run.state.status == GameStatus::Won {
            println!(
                "you won with {} points in {} rounds",
                session.run.state.game_score, session.run.state.round_number
            );
            break;
        }
    }
    Ok(())
}

fn apply_and_report(session: &mut Session, action: SavedAction) {
    match apply_action(&mut session.run, &action, &mut session.events) {
        Ok(summary) => {
            session.actions.push(action);
            drain_events(&mut session.events);
            if let Some(summary) = summary {
                println!("{summary}");
            }
            print_next_step(&session.run);
        }
        Err(err) => print_run_error(&err),
    }
}

fn apply_action(
    run: &mut RunState,
    action: &SavedAction,
    events: &mut EventBus,
) -> Result<Option<String>, RunError> {
    match action {
        SavedAction::NextRound => {
            if run.state.round_number == 0 {
                run.start_game(events)?;
            } else {
                run.start_round(events)?;
            }
            Ok(None)
        }
        SavedAction::Roll => run.roll(events).map(|outcome| Some(format_roll(&outcome))),
        SavedAction::Reroll => run.reroll(events).map(|outcome| Some(format_roll(&outcome))),
        SavedAction::Score {
            indices,
            partitioning,
        } => {
            let mut input = SelectionInput::new(indices.clone());
            input.partitioning = *partitioning;
            run.score_selection(&input, events)
                .map(|report| Some(format_score(&report)))
        }
        SavedAction::Bank => run
            .bank(events)
            .map(|points| Some(format!("banked {points}, game score {}", run.state.game_score))),
        SavedAction::Use { slot, die, face } => {
            let target = ConsumableTarget {
                die: *die,
                face: *face,
            };
            run.use_consumable(*slot, target, events)?;
            Ok(None)
        }
    }
}

fn save_game(path: &Path, session: &Session) -> anyhow::Result<()> {
    let saved = SavedGame {
        version: SAVE_SCHEMA_VERSION,
        seed: session.seed,
        actions: session.actions.clone(),
    };
    let body = serde_json::to_string_pretty(&saved)?;
    fs::write(path, body).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

fn load_game(path: &Path, assets: &Path) -> anyhow::Result<Session> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let saved: SavedGame =
        serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    if saved.version != SAVE_SCHEMA_VERSION {
        bail!("unsupported save version {}", saved.version);
    }
    let mut run = build_run(assets, saved.seed)?;
    let mut events = EventBus::default();
    for (step, action) in saved.actions.iter().enumerate() {
        apply_action(&mut run, action, &mut events)
            .with_context(|| format!("replay step {step} ({action:?})"))?;
    }
    events.drain().for_each(drop);
    Ok(Session {
        run,
        events,
        seed: saved.seed,
        assets: assets.to_path_buf(),
        actions: saved.actions,
    })
}

fn print_help() {
    println!("commands:");
    println!("  roll | r                  roll the dice in hand");
    println!("  score | s <dice> [#n]     set aside dice, e.g. 'score 0,2,4', 'score 0-2', 'score 024'");
    println!("  options | o <dice>        list the ways a selection can score");
    println!("  bank | b                  bank the round total");
    println!("  reroll | rr               roll the remaining dice");
    println!("  use | u <slot> [die] [face]  use a consumable");
    println!("  next | n                  start the next round");
    println!("  state | st, hand, inv     show game, hand or inventory");
    println!("  save [path], load [path]  save or replay a game");
    println!("  quit | q                  end the game between rounds");
    println!("  exit                      leave without ending the game");
}

fn prompt_text(run: &RunState) -> String {
    let phase = match run.phase() {
        None => "setup",
        Some(RoundPhase::RollPending) => "roll",
        Some(RoundPhase::AwaitingSelection) => "select",
        Some(RoundPhase::BankOrRerollPending) => "bank/reroll",
        Some(RoundPhase::Banked) => "banked",
        Some(RoundPhase::Flopped) => "flopped",
    };
    format!(
        "[round {} | {}/{} | {}]",
        run.state.round_number, run.state.game_score, run.state.win_condition, phase
    )
}

fn print_next_step(run: &RunState) {
    let Some(round) = run.round.as_ref() else {
        return;
    };
    let hint = match round.phase {
        RoundPhase::RollPending => "roll".to_string(),
        RoundPhase::AwaitingSelection if round.flop_prevented => {
            "flop absorbed: bank or reroll".to_string()
        }
        RoundPhase::AwaitingSelection => {
            format!("hand {}: score <dice>", format_hand(run))
        }
        RoundPhase::BankOrRerollPending => format!(
            "round {} points, {} dice left: bank or reroll",
            round.round_points,
            round.dice_hand.len()
        ),
        RoundPhase::Banked | RoundPhase::Flopped => "next round: next".to_string(),
    };
    println!("{hint}");
}

fn print_state(run: &RunState) {
    println!(
        "score {}/{} money {} round {} consecutive flops {}/{}",
        run.state.game_score,
        run.state.win_condition,
        run.state.money,
        run.state.round_number,
        run.state.consecutive_flops,
        run.state.flop_penalty.limit
    );
    if let Some(round) = run.round.as_ref() {
        println!(
            "phase {:?} round points {} rolls {} hot dice {}",
            round.phase, round.round_points, round.roll_number, round.hot_dice_counter
        );
    }
    let history = &run.state.history;
    println!(
        "banked {} flopped {} penalties {} best bank {}",
        history.rounds_banked, history.rounds_flopped, history.penalties_applied, history.highest_bank
    );
}

fn print_hand(run: &RunState) {
    match run.round.as_ref() {
        Some(round) => {
            for (idx, die) in round.dice_hand.iter().enumerate() {
                let value = die
                    .value()
                    .map(|value| value.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("  {idx}: {value} ({}) faces {:?}", die.material.id(), die.allowed_values);
            }
        }
        None => println!("no round yet"),
    }
}

fn format_hand(run: &RunState) -> String {
    let Some(round) = run.round.as_ref() else {
        return String::new();
    };
    round
        .dice_hand
        .iter()
        .enumerate()
        .map(|(idx, die)| match die.value() {
            Some(value) => format!("{idx}:{value}"),
            None => format!("{idx}:-"),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn print_inventory(run: &RunState) {
    let inventory = &run.state.inventory;
    println!("charms ({}/{}):", inventory.charms.len(), inventory.charm_slots);
    for (idx, charm) in inventory.charms.iter().enumerate() {
        let uses = charm
            .uses
            .map(|uses| uses.to_string())
            .unwrap_or_else(|| "unlimited".to_string());
        println!("  {idx}: {} [{}] uses {uses}", charm.name, charm.id);
    }
    println!(
        "consumables ({}/{}):",
        inventory.consumables.len(),
        inventory.consumable_slots
    );
    for (idx, item) in inventory.consumables.iter().enumerate() {
        println!("  {idx}: {} [{}] uses {}", item.name, item.id, item.uses);
    }
}

fn print_options(run: &RunState, input: &SelectionInput) {
    match run.preview_selection(input) {
        Ok(resolution) => {
            if let Some(err) = resolution.error.as_ref() {
                println!("not scorable: {err}");
            }
            for (idx, partitioning) in resolution.all_partitionings.iter().enumerate() {
                let marker = if resolution.chosen == Some(idx) { "*" } else { " " };
                println!(" {marker}#{idx}: {}", partitioning.summary());
            }
        }
        Err(err) => print_run_error(&err),
    }
}

fn print_run_error(err: &RunError) {
    println!("error: {err}");
}

fn drain_events(events: &mut EventBus) {
    for event in events.drain() {
        println!("  {}", format_event(&event));
    }
}

fn format_roll(outcome: &RollOutcome) -> String {
    match outcome {
        RollOutcome::Rolled { values } => format!("rolled {values:?}"),
        RollOutcome::FlopPrevented { charm, values } => {
            format!("rolled {values:?}: flop absorbed by {charm}")
        }
        RollOutcome::Flopped { forfeited, values } => {
            format!("rolled {values:?}: FLOP, lost {forfeited}")
        }
    }
}

fn format_score(report: &ScoreReport) -> String {
    let mut text = format!(
        "scored {} (base {}), round total {}",
        report.points, report.modifiers.base_points, report.round_points
    );
    if report.hot_dice {
        text.push_str(", HOT DICE: all dice back");
    }
    text
}

fn format_event(event: &Event) -> String {
    match event {
        Event::GameStarted {
            dice,
            win_condition,
        } => format!("game started: {dice} dice, first to {win_condition}"),
        Event::RoundStarted { round, dice } => format!("round {round} started with {dice} dice"),
        Event::DiceRolled { roll, values } => format!("roll {roll}: {values:?}"),
        Event::Flopped {
            forfeited,
            consecutive_flops,
        } => format!("flopped: forfeited {forfeited} ({consecutive_flops} in a row)"),
        Event::FlopPrevented { charm } => format!("flop prevented by {charm}"),
        Event::PenaltyApplied {
            penalty,
            game_score,
        } => format!("flop penalty -{penalty}, game score {game_score}"),
        Event::Scored {
            combinations,
            base,
            total,
            round_points,
        } => format!("scored {combinations:?}: base {base} total {total} round {round_points}"),
        Event::EffectApplied { source, line } => format!("{source}: {line}"),
        Event::HotDice {
            round_count,
            game_count,
        } => format!("hot dice ({round_count} this round, {game_count} this game)"),
        Event::Banked { banked, game_score } => {
            format!("banked {banked}, game score {game_score}")
        }
        Event::ConsumableUsed { id, uses_left } => format!("used {id} ({uses_left} left)"),
        Event::GameEnded { status, game_score } => {
            format!("game ended: {status:?} with {game_score}")
        }
    }
}

/// Dice indices from `0,2,4`, `0-2` or a run of single digits like `024`.
fn parse_indices_result(args: &[&str]) -> Result<Vec<usize>, String> {
    if args.is_empty() {
        return Err("missing indices".to_string());
    }
    let mut indices = Vec::new();
    for arg in args {
        let arg = arg.trim();
        if arg.len() > 1 && arg.chars().all(|ch| ch.is_ascii_digit()) {
            indices.extend(arg.chars().filter_map(|ch| ch.to_digit(10)).map(|d| d as usize));
            continue;
        }
        for part in arg.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            if let Some((start, end)) = part.split_once('-') {
                let start = start
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| "invalid range start".to_string())?;
                let end = end
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| "invalid range end".to_string())?;
                if start > end {
                    return Err("range start larger than end".to_string());
                }
                indices.extend(start..=end);
            } else {
                let idx = part
                    .parse::<usize>()
                    .map_err(|_| format!("invalid index '{part}'"))?;
                indices.push(idx);
            }
        }
    }
    if indices.is_empty() {
        return Err("missing indices".to_string());
    }
    Ok(indices)
}

/// Indices plus an optional `#n` partitioning choice.
fn parse_selection(args: &[&str]) -> Result<SelectionInput, String> {
    let mut partitioning = None;
    let mut rest = Vec::new();
    for arg in args {
        if let Some(choice) = arg.strip_prefix('#') {
            let choice = choice
                .parse::<usize>()
                .map_err(|_| format!("invalid partitioning '{arg}'"))?;
            partitioning = Some(choice);
        } else {
            rest.push(*arg);
        }
    }
    let indices = parse_indices_result(&rest)?;
    let mut input = SelectionInput::new(indices);
    input.partitioning = partitioning;
    Ok(input)
}

fn parse_use_args(args: &[&str]) -> Result<(usize, Option<usize>, Option<usize>), String> {
    let parse = |label: &str, value: Option<&&str>| -> Result<Option<usize>, String> {
        value
            .map(|raw| {
                raw.parse::<usize>()
                    .map_err(|_| format!("invalid {label} '{raw}'"))
            })
            .transpose()
    };
    let Some(slot) = parse("slot", args.first())? else {
        return Err("missing consumable slot".to_string());
    };
    if args.len() > 3 {
        return Err("too many arguments".to_string());
    }
    Ok((slot, parse("die", args.get(1))?, parse("face", args.get(2))?))
}
