use tower_core::{ItemCategory, ItemId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    Shop { category: Option<ItemCategory> },
    Select { id: ItemId },
    Acquire { id: ItemId },
    Stage,
    Start,
    Complete,
}

impl Command {
    /// Whether the command changes the profile and must save it afterwards.
    pub(crate) fn mutates_profile(self) -> bool {
        matches!(
            self,
            Command::Select { .. } | Command::Acquire { .. } | Command::Complete
        )
    }
}

/// Returns `Ok(None)` when help was requested.
pub(crate) fn parse_args(args: &[String]) -> Result<Option<Command>, String> {
    let Some(command) = args.first() else {
        return Err(usage_text());
    };
    let command_args = &args[1..];

    let parsed = match command.as_str() {
        "-h" | "--help" => return Ok(None),
        "shop" => {
            let category = match command_args {
                [] => None,
                [raw] => Some(raw.parse::<ItemCategory>().map_err(|err| err.to_string())?),
                _ => return Err("shop takes at most one category".to_string()),
            };
            Command::Shop { category }
        }
        "select" => Command::Select {
            id: single_item_id("select", command_args)?,
        },
        "acquire" => Command::Acquire {
            id: single_item_id("acquire", command_args)?,
        },
        "stage" => no_arguments("stage", command_args, Command::Stage)?,
        "start" => no_arguments("start", command_args, Command::Start)?,
        "complete" => no_arguments("complete", command_args, Command::Complete)?,
        other => return Err(format!("unknown subcommand '{other}'")),
    };
    Ok(Some(parsed))
}

fn single_item_id(command: &str, args: &[String]) -> Result<ItemId, String> {
    let [value] = args else {
        return Err(format!("{command} requires exactly one item id"));
    };
    value
        .parse::<u32>()
        .map(ItemId)
        .map_err(|_| format!("invalid item id '{value}' (expected u32)"))
}

fn no_arguments(command: &str, args: &[String], parsed: Command) -> Result<Command, String> {
    if args.is_empty() {
        Ok(parsed)
    } else {
        Err(format!("{command} takes no arguments"))
    }
}

pub(crate) fn usage_text() -> String {
    [
        "tower_game - shop and level progression",
        "",
        "Usage:",
        "  tower_game shop [skin|weapon]   list a shop tab in display order",
        "  tower_game select <id>          equip an owned item or preview a locked one",
        "  tower_game acquire <id>         grant an item and equip it",
        "  tower_game stage                show the chapter strip for the current level",
        "  tower_game start                print the launch plan for the current level",
        "  tower_game complete             mark the current level as completed",
        "",
        "Environment:",
        "  TOWER_ROOT      project root (defaults to upward search from the executable)",
        "  TOWER_PROFILE   profile file (defaults to <root>/saves/profile.json)",
        "  RUST_LOG        log filter (defaults to info)",
    ]
    .join("\n")
}
