use std::env;
use std::io::{self, Write};
use std::process::ExitCode;

use thiserror::Error;
use tower_core::{
    build_launch_plan, load_profile, save_profile, stage_track, ContentDatabase, ContentLoadError,
    InvariantViolation, ItemCategory, LaunchError, LevelError, LoadoutSlot, ProfileData,
    ProfileError, ProfileStore, SessionError, ShopSession, ShopView, StageSlotState, StartupError,
};
use tracing::{error, info};

use super::bootstrap::{build_app, init_tracing, AppContext};
use super::command::{parse_args, usage_text, Command};

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Content(#[from] ContentLoadError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error(transparent)]
    Launch(#[from] LaunchError),
    #[error("shop state is inconsistent with the profile: {0}")]
    Invariant(#[from] InvariantViolation),
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

pub(crate) fn run() -> ExitCode {
    let args = env::args().skip(1).collect::<Vec<_>>();
    let command = match parse_args(&args) {
        Ok(Some(command)) => command,
        Ok(None) => {
            println!("{}", usage_text());
            return ExitCode::SUCCESS;
        }
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(1);
        }
    };

    init_tracing();
    info!("=== Tower Startup ===");

    let result = build_app().and_then(|context| {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        execute(command, &context, &mut out)
    });
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "command_failed");
            eprintln!("{err}");
            ExitCode::from(1)
        }
    }
}

pub(crate) fn execute(
    command: Command,
    context: &AppContext,
    out: &mut impl Write,
) -> Result<(), AppError> {
    let data = load_profile(&context.profile_path)?;
    let mut session = ShopSession::open(&context.content.items, ProfileStore::new(data))?;
    // Initial state derivation is not news to the user.
    session.take_notifications();

    match command {
        Command::Shop { category } => print_shop(&session, category, out)?,
        Command::Select { id } => {
            if session.select_item(id)? {
                writeln!(out, "equipped item {id}")?;
            } else {
                writeln!(out, "item {id} is locked; showing preview only")?;
            }
        }
        Command::Acquire { id } => {
            if session.acquire_item(id)? {
                writeln!(out, "acquired item {id}")?;
            } else {
                writeln!(out, "item {id} is already owned")?;
            }
        }
        Command::Stage => print_stage(session.profile().level_progress(), out)?,
        Command::Start => print_launch_plan(&context.content, session.profile().data(), out)?,
        Command::Complete => {
            let level_progress = session.complete_level()?;
            writeln!(out, "level completed; progress is now {level_progress}")?;
        }
    }

    for change in session.take_notifications() {
        writeln!(
            out,
            "  item {} ({}): {} -> {}",
            change.item_id, change.category, change.previous, change.state
        )?;
    }

    if command.mutates_profile() {
        session.check_invariants()?;
        save_profile(&context.profile_path, session.profile().data())?;
        info!(path = %context.profile_path.display(), "profile_saved");
    }
    session.close();
    Ok(())
}

fn print_shop(
    session: &ShopSession<'_>,
    category: Option<ItemCategory>,
    out: &mut impl Write,
) -> io::Result<()> {
    let mut view = ShopView::open(session);
    if let Some(category) = category {
        view.change_tab(session, category);
    }

    let tabs = ShopView::tabs()
        .iter()
        .map(|tab| {
            if *tab == view.category() {
                format!("[{tab}]")
            } else {
                tab.to_string()
            }
        })
        .collect::<Vec<_>>();
    writeln!(out, "{}", tabs.join(" "))?;

    let rows = view.rows(session);
    if rows.is_empty() {
        writeln!(out, "  (no items)")?;
    }
    for row in rows {
        let cursor = if row.selected { '>' } else { ' ' };
        writeln!(
            out,
            "{cursor} {:>4}  {:<20} {}",
            row.item_id, row.model_ref, row.state
        )?;
    }
    if let Some(preview) = view.preview() {
        writeln!(out, "preview: {preview}")?;
    }
    Ok(())
}

fn print_stage(level_progress: i64, out: &mut impl Write) -> Result<(), AppError> {
    let track = stage_track(level_progress)?;
    writeln!(
        out,
        "chapter {} level {}",
        track.index.chapter_number(),
        track.index.level_in_chapter + 1
    )?;
    let strip = track
        .slots
        .iter()
        .map(|slot| {
            let mark = match slot.state {
                StageSlotState::Passed => 'x',
                StageSlotState::Current => '>',
                StageSlotState::Future => ' ',
            };
            if slot.boss {
                format!("[{mark}B]")
            } else {
                format!("[{mark}]")
            }
        })
        .collect::<String>();
    writeln!(out, "{strip}")?;
    writeln!(out, "progress {}%", track.progress_percent)?;
    Ok(())
}

fn print_launch_plan(
    content: &ContentDatabase,
    profile: &ProfileData,
    out: &mut impl Write,
) -> Result<(), AppError> {
    let plan = build_launch_plan(content, profile)?;
    let model_or_none = |slot: Option<&LoadoutSlot>| {
        slot.map_or_else(|| "(none)".to_string(), |slot| slot.model_ref.clone())
    };

    writeln!(
        out,
        "chapter {} level {}{}",
        plan.index.chapter_number(),
        plan.index.level_in_chapter + 1,
        if plan.has_boss_fight() { " (boss)" } else { "" }
    )?;
    writeln!(out, "skin: {}", model_or_none(plan.loadout.skin.as_ref()))?;
    writeln!(out, "weapon: {}", model_or_none(plan.loadout.weapon.as_ref()))?;
    writeln!(out, "spawn points: {}", plan.spawn_point_count)?;
    writeln!(out, "enemies: {}", plan.enemy_models.join(", "))?;
    if let Some(boss) = &plan.boss_model {
        writeln!(out, "boss: {boss}")?;
    }
    writeln!(out, "killed: {}", plan.enemy_counter().display_text())?;
    Ok(())
}
