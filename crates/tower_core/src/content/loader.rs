use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};
use tracing::info;

use crate::catalog::{ItemCategory, ItemDefinition, ItemId};
use crate::level::{EnemyDef, EnemyId, LevelConfig, LEVELS_PER_CHAPTER};

use super::database::ContentDatabase;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentErrorCode {
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    UnknownDefType,
    UnknownField,
    DuplicateField,
    MissingField,
    InvalidValue,
    DuplicateId,
}

#[derive(Debug, Clone)]
pub struct ContentLoadError {
    pub code: ContentErrorCode,
    pub message: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for ContentLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (file={}, line={}, column={})",
                self.code,
                self.message,
                self.file_path.display(),
                loc.line,
                loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (file={})",
                self.code,
                self.message,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for ContentLoadError {}

const ITEM_FIELDS: &[&str] = &["id", "category", "model"];
const ENEMY_FIELDS: &[&str] = &["id", "model"];
const LEVEL_FIELDS: &[&str] = &[
    "chapter",
    "level",
    "spawnPoints",
    "maxEnemies",
    "enemies",
    "boss",
];

#[derive(Debug, Default)]
struct PendingContent {
    items: Vec<ItemDefinition>,
    enemies: Vec<EnemyDef>,
    levels: Vec<LevelConfig>,
    seen_items: HashSet<ItemId>,
    seen_enemies: HashSet<EnemyId>,
    seen_levels: HashSet<(u32, u32)>,
}

/// Reads every XML file under `content_dir` in sorted relative-path order.
/// Item order across files is therefore stable, which fixes the catalog
/// tie-break order.
pub fn load_content_database(content_dir: &Path) -> Result<ContentDatabase, ContentLoadError> {
    let xml_files = collect_xml_files_sorted(content_dir)
        .map_err(|error| read_error(error.path, error.source))?;

    let mut pending = PendingContent::default();
    for xml_file in &xml_files {
        let raw = fs::read_to_string(xml_file)
            .map_err(|source| read_error(xml_file.clone(), source))?;
        parse_defs_document(xml_file, &raw, &mut pending)?;
    }

    let database = ContentDatabase::from_parts(pending.items, pending.enemies, pending.levels)
        .map_err(|error| ContentLoadError {
            code: ContentErrorCode::DuplicateId,
            message: error.to_string(),
            file_path: content_dir.to_path_buf(),
            location: None,
        })?;

    info!(
        content_dir = %content_dir.display(),
        xml_files = xml_files.len(),
        items = database.items.len(),
        enemies = database.enemies.enemies().len(),
        levels = database.levels.len(),
        "content_loaded"
    );
    Ok(database)
}

struct ParseContext<'a, 'input> {
    file_path: &'a Path,
    doc: &'a Document<'input>,
}

impl ParseContext<'_, '_> {
    fn error_at(
        &self,
        code: ContentErrorCode,
        message: String,
        node: Node<'_, '_>,
    ) -> ContentLoadError {
        let pos = self.doc.text_pos_at(node.range().start);
        ContentLoadError {
            code,
            message,
            file_path: self.file_path.to_path_buf(),
            location: Some(SourceLocation {
                line: pos.row as usize,
                column: pos.col as usize,
            }),
        }
    }
}

fn parse_defs_document(
    file_path: &Path,
    raw: &str,
    pending: &mut PendingContent,
) -> Result<(), ContentLoadError> {
    let doc = Document::parse(raw).map_err(|error| ContentLoadError {
        code: ContentErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })?;
    let ctx = ParseContext {
        file_path,
        doc: &doc,
    };

    let root = doc.root_element();
    if root.tag_name().name() != "Defs" {
        return Err(ctx.error_at(
            ContentErrorCode::InvalidRoot,
            "root element must be <Defs>".to_string(),
            root,
        ));
    }

    for child in root.children().filter(|node| node.is_element()) {
        match child.tag_name().name() {
            "ItemDef" => {
                let def = parse_item_def(&ctx, child)?;
                if !pending.seen_items.insert(def.id) {
                    return Err(ctx.error_at(
                        ContentErrorCode::DuplicateId,
                        format!("duplicate ItemDef id {}", def.id),
                        child,
                    ));
                }
                pending.items.push(def);
            }
            "EnemyDef" => {
                let def = parse_enemy_def(&ctx, child)?;
                if !pending.seen_enemies.insert(def.id) {
                    return Err(ctx.error_at(
                        ContentErrorCode::DuplicateId,
                        format!("duplicate EnemyDef id {}", def.id),
                        child,
                    ));
                }
                pending.enemies.push(def);
            }
            "LevelDef" => {
                let def = parse_level_def(&ctx, child)?;
                if !pending.seen_levels.insert((def.chapter, def.level)) {
                    return Err(ctx.error_at(
                        ContentErrorCode::DuplicateId,
                        format!(
                            "duplicate LevelDef for chapter {} level {}",
                            def.chapter, def.level
                        ),
                        child,
                    ));
                }
                pending.levels.push(def);
            }
            other => {
                return Err(ctx.error_at(
                    ContentErrorCode::UnknownDefType,
                    format!(
                        "unsupported def type <{other}>; expected <ItemDef>, <EnemyDef> or <LevelDef>"
                    ),
                    child,
                ))
            }
        }
    }
    Ok(())
}

fn parse_item_def(
    ctx: &ParseContext<'_, '_>,
    node: Node<'_, '_>,
) -> Result<ItemDefinition, ContentLoadError> {
    let fields = collect_fields(ctx, node, "ItemDef", ITEM_FIELDS)?;
    let id = required_u32(ctx, &fields, node, "ItemDef", "id")?;
    let (category_text, category_node) =
        required_text(ctx, &fields, node, "ItemDef", "category")?;
    let category = category_text.parse::<ItemCategory>().map_err(|error| {
        ctx.error_at(
            ContentErrorCode::InvalidValue,
            error.to_string(),
            category_node,
        )
    })?;
    let (model_ref, _) = required_text(ctx, &fields, node, "ItemDef", "model")?;

    Ok(ItemDefinition {
        id: ItemId(id),
        category,
        model_ref,
    })
}

fn parse_enemy_def(
    ctx: &ParseContext<'_, '_>,
    node: Node<'_, '_>,
) -> Result<EnemyDef, ContentLoadError> {
    let fields = collect_fields(ctx, node, "EnemyDef", ENEMY_FIELDS)?;
    let id = required_u32(ctx, &fields, node, "EnemyDef", "id")?;
    let (model_ref, _) = required_text(ctx, &fields, node, "EnemyDef", "model")?;
    Ok(EnemyDef {
        id: EnemyId(id),
        model_ref,
    })
}

fn parse_level_def(
    ctx: &ParseContext<'_, '_>,
    node: Node<'_, '_>,
) -> Result<LevelConfig, ContentLoadError> {
    let fields = collect_fields(ctx, node, "LevelDef", LEVEL_FIELDS)?;

    let chapter = required_u32(ctx, &fields, node, "LevelDef", "chapter")?;
    if chapter == 0 {
        return Err(ctx.error_at(
            ContentErrorCode::InvalidValue,
            "chapter is 1-based and must be >= 1".to_string(),
            fields["chapter"],
        ));
    }
    let level = required_u32(ctx, &fields, node, "LevelDef", "level")?;
    if level >= LEVELS_PER_CHAPTER {
        return Err(ctx.error_at(
            ContentErrorCode::InvalidValue,
            format!("level must be in 0..={}", LEVELS_PER_CHAPTER - 1),
            fields["level"],
        ));
    }
    let spawn_point_count = required_u32(ctx, &fields, node, "LevelDef", "spawnPoints")?;
    let max_enemy_count = required_u32(ctx, &fields, node, "LevelDef", "maxEnemies")?;

    let enemy_ids = match fields.get("enemies") {
        Some(field) => field_text(*field)
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| parse_u32(ctx, *field, "enemies", part).map(EnemyId))
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };
    let boss_enemy_id = match fields.get("boss") {
        Some(field) => Some(EnemyId(parse_u32(ctx, *field, "boss", &field_text(*field))?)),
        None => None,
    };

    if level == LEVELS_PER_CHAPTER - 1 && boss_enemy_id.is_none() {
        return Err(ctx.error_at(
            ContentErrorCode::MissingField,
            format!(
                "chapter {chapter} level {level} is a boss level and must declare <boss>"
            ),
            node,
        ));
    }

    Ok(LevelConfig {
        chapter,
        level,
        spawn_point_count,
        enemy_ids,
        boss_enemy_id,
        max_enemy_count,
    })
}

fn collect_fields<'a, 'input>(
    ctx: &ParseContext<'_, '_>,
    node: Node<'a, 'input>,
    def_type: &str,
    allowed: &[&'static str],
) -> Result<HashMap<&'static str, Node<'a, 'input>>, ContentLoadError> {
    let mut fields = HashMap::new();
    for field in node.children().filter(|child| child.is_element()) {
        let field_name = field.tag_name().name();
        let Some(known) = allowed.iter().copied().find(|name| *name == field_name) else {
            return Err(ctx.error_at(
                ContentErrorCode::UnknownField,
                format!("unknown field <{field_name}> in <{def_type}>"),
                field,
            ));
        };
        if fields.insert(known, field).is_some() {
            return Err(ctx.error_at(
                ContentErrorCode::DuplicateField,
                format!("duplicate field <{field_name}> in <{def_type}>"),
                field,
            ));
        }
    }
    Ok(fields)
}

fn field_text(node: Node<'_, '_>) -> String {
    node.text().map(str::trim).unwrap_or_default().to_string()
}

fn required_text<'a, 'input>(
    ctx: &ParseContext<'_, '_>,
    fields: &HashMap<&'static str, Node<'a, 'input>>,
    def_node: Node<'_, '_>,
    def_type: &str,
    field_name: &str,
) -> Result<(String, Node<'a, 'input>), ContentLoadError> {
    let Some(field) = fields.get(field_name).copied() else {
        return Err(ctx.error_at(
            ContentErrorCode::MissingField,
            format!("missing required field <{field_name}> in <{def_type}>"),
            def_node,
        ));
    };
    let value = field_text(field);
    if value.is_empty() {
        return Err(ctx.error_at(
            ContentErrorCode::MissingField,
            format!("field <{field_name}> must not be empty"),
            field,
        ));
    }
    Ok((value, field))
}

fn required_u32(
    ctx: &ParseContext<'_, '_>,
    fields: &HashMap<&'static str, Node<'_, '_>>,
    def_node: Node<'_, '_>,
    def_type: &str,
    field_name: &str,
) -> Result<u32, ContentLoadError> {
    let (value, field) = required_text(ctx, fields, def_node, def_type, field_name)?;
    parse_u32(ctx, field, field_name, &value)
}

fn parse_u32(
    ctx: &ParseContext<'_, '_>,
    field: Node<'_, '_>,
    field_name: &str,
    value: &str,
) -> Result<u32, ContentLoadError> {
    value.parse::<u32>().map_err(|_| {
        ctx.error_at(
            ContentErrorCode::InvalidValue,
            format!("{field_name} '{value}' is not a non-negative integer"),
            field,
        )
    })
}

struct ReadError {
    path: PathBuf,
    source: std::io::Error,
}

fn collect_xml_files_sorted(root: &Path) -> Result<Vec<PathBuf>, ReadError> {
    let mut files = Vec::<PathBuf>::new();
    collect_recursive(root, &mut files)?;
    files.sort_by_key(|path| normalize_rel_path(path.strip_prefix(root).unwrap_or(path)));
    Ok(files)
}

fn collect_recursive(current: &Path, files: &mut Vec<PathBuf>) -> Result<(), ReadError> {
    let entries = fs::read_dir(current).map_err(|source| ReadError {
        path: current.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| ReadError {
            path: current.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_recursive(&path, files)?;
        } else if path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
        {
            files.push(path);
        }
    }
    Ok(())
}

fn normalize_rel_path(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("/")
}

fn read_error(path: PathBuf, source: std::io::Error) -> ContentLoadError {
    ContentLoadError {
        code: ContentErrorCode::ReadFile,
        message: format!("failed to read content: {source}"),
        file_path: path,
        location: None,
    }
}
