use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use roxmltree::{Document, Node};
use tracing::debug;

use crate::combat::{OnHitStatus, Weapon, WeaponKind};
use crate::damage::{DamageType, Damageable, Resistance, Resistances};
use crate::powers::{Power, PowerKind};
use crate::status::StatusKind;
use crate::world::{CreatureStats, IdleBehavior};

use super::database::{CreatureDef, DefDatabase, DefId, WeaponDef};
use super::discovery::{discover_def_sources, ReadError};

const BASE_SOURCE_NAME: &str = "base";
const BASE_DEFS_PATH: &str = "content/base_defs.xml";
const BASE_DEFS_XML: &str = include_str!("../../content/base_defs.xml");

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
    DuplicateDefInSource,
    UnresolvedReference,
}

#[derive(Debug, Clone)]
pub struct ContentCompileError {
    pub code: ContentErrorCode,
    pub message: String,
    pub source_name: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for ContentCompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (source={}, file={}, line={}, column={})",
                self.code,
                self.message,
                self.source_name,
                self.file_path.display(),
                loc.line,
                loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (source={}, file={})",
                self.code,
                self.message,
                self.source_name,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for ContentCompileError {}

#[derive(Debug, Clone)]
struct PendingWeapon {
    def_name: String,
    label: String,
    weapon: Weapon,
}

#[derive(Debug, Clone)]
struct PendingCreature {
    def_name: String,
    label: String,
    weapon: String,
    weapon_origin: ContentOrigin,
    damageable: Damageable,
    stats: CreatureStats,
    idle_behavior: IdleBehavior,
    conductive: bool,
    powers: Vec<Power>,
}

/// Where a field came from, kept so references can be reported after merging.
#[derive(Debug, Clone)]
struct ContentOrigin {
    source_name: String,
    file_path: PathBuf,
    location: Option<SourceLocation>,
}

#[derive(Debug, Default)]
struct ParsedDefs {
    weapons: Vec<(PendingWeapon, ContentOrigin)>,
    creatures: Vec<(PendingCreature, ContentOrigin)>,
}

/// Later sources override earlier ones by `defName`; one source may define a name once.
#[derive(Debug, Default)]
struct DefMerger {
    weapons: BTreeMap<String, PendingWeapon>,
    creatures: BTreeMap<String, PendingCreature>,
}

impl DefMerger {
    fn add_source(
        &mut self,
        source_name: &str,
        documents: &[(PathBuf, String)],
    ) -> Result<(), ContentCompileError> {
        let mut seen_in_source = HashSet::<String>::new();
        for (file_path, raw) in documents {
            let parsed = parse_defs_document(source_name, file_path, raw)?;
            let names = parsed
                .weapons
                .iter()
                .map(|(def, origin)| (format!("WeaponDef:{}", def.def_name), origin))
                .chain(
                    parsed
                        .creatures
                        .iter()
                        .map(|(def, origin)| (format!("CreatureDef:{}", def.def_name), origin)),
                );
            for (key, origin) in names {
                if !seen_in_source.insert(key.clone()) {
                    return Err(ContentCompileError {
                        code: ContentErrorCode::DuplicateDefInSource,
                        message: format!(
                            "duplicate {key} in source '{source_name}'; each source may define a defName only once"
                        ),
                        source_name: origin.source_name.clone(),
                        file_path: origin.file_path.clone(),
                        location: origin.location,
                    });
                }
            }
            for (def, _) in parsed.weapons {
                self.weapons.insert(def.def_name.clone(), def);
            }
            for (def, _) in parsed.creatures {
                self.creatures.insert(def.def_name.clone(), def);
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<DefDatabase, ContentCompileError> {
        for creature in self.creatures.values() {
            if !self.weapons.contains_key(&creature.weapon) {
                return Err(ContentCompileError {
                    code: ContentErrorCode::UnresolvedReference,
                    message: format!(
                        "creature '{}' references unknown weapon '{}'",
                        creature.def_name, creature.weapon
                    ),
                    source_name: creature.weapon_origin.source_name.clone(),
                    file_path: creature.weapon_origin.file_path.clone(),
                    location: creature.weapon_origin.location,
                });
            }
        }
        let weapons = self
            .weapons
            .into_values()
            .map(|def| WeaponDef {
                id: DefId(0),
                def_name: def.def_name,
                label: def.label,
                weapon: def.weapon,
            })
            .collect::<Vec<_>>();
        let creatures = self
            .creatures
            .into_values()
            .map(|def| CreatureDef {
                id: DefId(0),
                def_name: def.def_name,
                label: def.label,
                weapon: def.weapon,
                damageable: def.damageable,
                stats: def.stats,
                idle_behavior: def.idle_behavior,
                conductive: def.conductive,
                powers: def.powers,
            })
            .collect::<Vec<_>>();
        debug!(
            weapons = weapons.len(),
            creatures = creatures.len(),
            "defs_compiled"
        );
        Ok(DefDatabase::from_defs(weapons, creatures))
    }
}

/// Compiles the definitions embedded in the engine.
pub fn compile_base_defs() -> Result<DefDatabase, ContentCompileError> {
    compile_def_dirs(&[])
}

/// Compiles the embedded base set, then every XML file under each directory in order.
pub fn compile_def_dirs(dirs: &[PathBuf]) -> Result<DefDatabase, ContentCompileError> {
    let mut merger = DefMerger::default();
    merger.add_source(
        BASE_SOURCE_NAME,
        &[(PathBuf::from(BASE_DEFS_PATH), BASE_DEFS_XML.to_string())],
    )?;
    let sources = discover_def_sources(dirs).map_err(|error| read_error("<discovery>", error))?;
    for source in sources {
        let mut documents = Vec::with_capacity(source.files.len());
        for file in source.files {
            let raw = fs::read_to_string(&file).map_err(|io_error| {
                read_error(
                    &source.name,
                    ReadError {
                        path: file.clone(),
                        source: io_error,
                    },
                )
            })?;
            documents.push((file, raw));
        }
        merger.add_source(&source.name, &documents)?;
    }
    merger.finish()
}

/// Compiles the embedded base set plus one in-memory document layered on top.
pub fn compile_defs_str(source_name: &str, raw: &str) -> Result<DefDatabase, ContentCompileError> {
    let mut merger = DefMerger::default();
    merger.add_source(
        BASE_SOURCE_NAME,
        &[(PathBuf::from(BASE_DEFS_PATH), BASE_DEFS_XML.to_string())],
    )?;
    merger.add_source(source_name, &[(PathBuf::from(source_name), raw.to_string())])?;
    merger.finish()
}

/// Per-document state shared by the field parsers.
struct DocContext<'d, 'input> {
    source_name: &'d str,
    file_path: &'d Path,
    doc: &'d Document<'input>,
}

impl DocContext<'_, '_> {
    fn origin(&self, node: Node<'_, '_>) -> ContentOrigin {
        let pos = self.doc.text_pos_at(node.range().start);
        ContentOrigin {
            source_name: self.source_name.to_string(),
            file_path: self.file_path.to_path_buf(),
            location: Some(SourceLocation {
                line: pos.row as usize,
                column: pos.col as usize,
            }),
        }
    }

    fn error(
        &self,
        code: ContentErrorCode,
        message: String,
        node: Node<'_, '_>,
    ) -> ContentCompileError {
        let origin = self.origin(node);
        ContentCompileError {
            code,
            message,
            source_name: origin.source_name,
            file_path: origin.file_path,
            location: origin.location,
        }
    }

    fn text(&self, node: Node<'_, '_>, field: &str) -> Result<String, ContentCompileError> {
        let value = node.text().map(str::trim).unwrap_or_default().to_string();
        if value.is_empty() {
            return Err(self.error(
                ContentErrorCode::MissingField,
                format!("field <{field}> must not be empty"),
                node,
            ));
        }
        Ok(value)
    }

    fn number<T: FromStr>(
        &self,
        node: Node<'_, '_>,
        field: &str,
    ) -> Result<T, ContentCompileError> {
        let value = self.text(node, field)?;
        value.parse::<T>().map_err(|_| {
            self.error(
                ContentErrorCode::InvalidValue,
                format!("{field} '{value}' is not a valid number"),
                node,
            )
        })
    }

    fn float_in(
        &self,
        node: Node<'_, '_>,
        field: &str,
        min: f64,
        max: f64,
    ) -> Result<f64, ContentCompileError> {
        let parsed: f64 = self.number(node, field)?;
        if !parsed.is_finite() || parsed < min || parsed > max {
            return Err(self.error(
                ContentErrorCode::InvalidValue,
                format!("{field} must be within [{min}, {max}]"),
                node,
            ));
        }
        Ok(parsed)
    }

    fn boolean(&self, node: Node<'_, '_>, field: &str) -> Result<bool, ContentCompileError> {
        match self.text(node, field)?.as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(self.error(
                ContentErrorCode::InvalidValue,
                format!("{field} '{other}' must be true or false"),
                node,
            )),
        }
    }

    fn token<T>(
        &self,
        node: Node<'_, '_>,
        field: &str,
        allowed: &str,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Result<T, ContentCompileError> {
        let value = self.text(node, field)?;
        parse(&value).ok_or_else(|| {
            self.error(
                ContentErrorCode::InvalidValue,
                format!("invalid {field} '{value}'; allowed values: {allowed}"),
                node,
            )
        })
    }

    fn check_unique(
        &self,
        seen: &mut HashSet<String>,
        field: Node<'_, '_>,
        def_type: &str,
    ) -> Result<String, ContentCompileError> {
        let field_name = field.tag_name().name().to_string();
        if !seen.insert(field_name.clone()) {
            return Err(self.error(
                ContentErrorCode::DuplicateField,
                format!("duplicate field <{field_name}> in <{def_type}>"),
                field,
            ));
        }
        Ok(field_name)
    }

    fn unknown_field(&self, field: Node<'_, '_>, def_type: &str) -> ContentCompileError {
        self.error(
            ContentErrorCode::UnknownField,
            format!("unknown field <{}> in <{def_type}>", field.tag_name().name()),
            field,
        )
    }

    fn missing<T>(
        &self,
        value: Option<T>,
        field: &str,
        def_type: &str,
        node: Node<'_, '_>,
    ) -> Result<T, ContentCompileError> {
        value.ok_or_else(|| {
            self.error(
                ContentErrorCode::MissingField,
                format!("missing required field <{field}> in <{def_type}>"),
                node,
            )
        })
    }
}

fn parse_defs_document(
    source_name: &str,
    file_path: &Path,
    raw: &str,
) -> Result<ParsedDefs, ContentCompileError> {
    let doc = Document::parse(raw).map_err(|error| ContentCompileError {
        code: ContentErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        source_name: source_name.to_string(),
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })?;
    let ctx = DocContext {
        source_name,
        file_path,
        doc: &doc,
    };

    let root = doc.root_element();
    if root.tag_name().name() != "Defs" {
        return Err(ctx.error(
            ContentErrorCode::InvalidRoot,
            "root element must be <Defs>".to_string(),
            root,
        ));
    }

    let mut parsed = ParsedDefs::default();
    for child in root.children().filter(|node| node.is_element()) {
        match child.tag_name().name() {
            "WeaponDef" => parsed
                .weapons
                .push((parse_weapon_def(&ctx, child)?, ctx.origin(child))),
            "CreatureDef" => parsed
                .creatures
                .push((parse_creature_def(&ctx, child)?, ctx.origin(child))),
            other => {
                let message =
                    format!("unsupported def type <{other}>; expected <WeaponDef> or <CreatureDef>");
                return Err(ctx.error(ContentErrorCode::UnknownDefType, message, child));
            }
        }
    }
    Ok(parsed)
}

fn parse_weapon_def(
    ctx: &DocContext<'_, '_>,
    node: Node<'_, '_>,
) -> Result<PendingWeapon, ContentCompileError> {
    const DEF: &str = "WeaponDef";
    let mut seen_fields = HashSet::<String>::new();
    let mut def_name = None;
    let mut label = None;
    let mut kind = None;
    let mut damage = None;
    let mut damage_type = None;
    let mut accuracy = None;
    let mut range = None;
    let mut penetration = None;
    let mut spread = None;
    let mut flanking_bonus = None;
    let mut knockback = None;
    let mut attack_time_multiplier = None;
    let mut clip_size = None;
    let mut on_hit_status = None;
    let mut on_hit_duration = None;
    let mut on_hit_magnitude = None;

    for field in node.children().filter(|child| child.is_element()) {
        let field_name = ctx.check_unique(&mut seen_fields, field, DEF)?;
        match field_name.as_str() {
            "defName" => def_name = Some(ctx.text(field, "defName")?),
            "label" => label = Some(ctx.text(field, "label")?),
            "kind" => {
                kind = Some(ctx.token(field, "kind", "melee, gun, spread", WeaponKind::from_token)?)
            }
            "damage" => damage = Some(ctx.number::<i32>(field, "damage")?),
            "damageType" => {
                damage_type = Some(ctx.token(
                    field,
                    "damageType",
                    "Physical, Heat, Cold, Electric, Poison, Radiation",
                    DamageType::from_token,
                )?)
            }
            "accuracy" => accuracy = Some(ctx.float_in(field, "accuracy", 0.0, 1.0)?),
            "range" => range = Some(ctx.float_in(field, "range", 1.0, 64.0)?),
            "penetration" => penetration = Some(ctx.number::<i32>(field, "penetration")?),
            "spreadDegrees" => spread = Some(ctx.float_in(field, "spreadDegrees", 0.0, 180.0)?),
            "flankingBonus" => flanking_bonus = Some(ctx.number::<i32>(field, "flankingBonus")?),
            "knockback" => knockback = Some(ctx.number::<u32>(field, "knockback")?),
            "attackTimeMultiplier" => {
                attack_time_multiplier =
                    Some(ctx.float_in(field, "attackTimeMultiplier", 0.0, 10.0)?)
            }
            "clipSize" => clip_size = Some(ctx.number::<u32>(field, "clipSize")?),
            "onHitStatus" => {
                on_hit_status = Some(ctx.token(
                    field,
                    "onHitStatus",
                    "burning, stunned, slowed, poisoned, regenerating, shielded",
                    StatusKind::from_token,
                )?)
            }
            "onHitDuration" => on_hit_duration = Some(ctx.number::<u32>(field, "onHitDuration")?),
            "onHitMagnitude" => {
                on_hit_magnitude = Some(ctx.number::<i32>(field, "onHitMagnitude")?)
            }
            _ => return Err(ctx.unknown_field(field, DEF)),
        }
    }

    let def_name = ctx.missing(def_name, "defName", DEF, node)?;
    let label = ctx.missing(label, "label", DEF, node)?;
    let kind = ctx.missing(kind, "kind", DEF, node)?;
    let damage = ctx.missing(damage, "damage", DEF, node)?;

    let mut weapon = Weapon::new(label.clone(), kind, damage);
    if let Some(damage_type) = damage_type {
        weapon = weapon.with_damage_type(damage_type);
    }
    if let Some(accuracy) = accuracy {
        weapon = weapon.with_accuracy(accuracy);
    }
    if let Some(range) = range {
        weapon = weapon.with_range(range);
    }
    if let Some(penetration) = penetration {
        weapon = weapon.with_penetration(penetration);
    }
    if let Some(spread) = spread {
        weapon = weapon.with_spread(spread);
    }
    if let Some(bonus) = flanking_bonus {
        weapon = weapon.with_flanking_bonus(bonus);
    }
    if let Some(tiles) = knockback {
        weapon = weapon.with_knockback(tiles);
    }
    if let Some(multiplier) = attack_time_multiplier {
        weapon = weapon.with_attack_time_multiplier(multiplier);
    }
    if let Some(clip) = clip_size {
        weapon = weapon.with_clip(clip);
    }
    if let Some(status) = on_hit_status {
        let duration = ctx.missing(on_hit_duration, "onHitDuration", DEF, node)?;
        weapon = weapon.with_on_hit(OnHitStatus {
            kind: status,
            duration,
            magnitude: on_hit_magnitude.unwrap_or(0),
        });
    }

    Ok(PendingWeapon {
        def_name,
        label,
        weapon,
    })
}

fn parse_creature_def(
    ctx: &DocContext<'_, '_>,
    node: Node<'_, '_>,
) -> Result<PendingCreature, ContentCompileError> {
    const DEF: &str = "CreatureDef";
    let mut seen_fields = HashSet::<String>::new();
    let mut def_name = None;
    let mut label = None;
    let mut weapon = None;
    let mut health = None;
    let mut evasion = None;
    let mut armor = None;
    let mut penetration_block = None;
    let mut resistances = Resistances::default();
    let mut stats = CreatureStats::default();
    let mut idle_behavior = IdleBehavior::Stationary;
    let mut conductive = false;
    let mut powers = Vec::new();

    for field in node.children().filter(|child| child.is_element()) {
        let field_name = ctx.check_unique(&mut seen_fields, field, DEF)?;
        match field_name.as_str() {
            "defName" => def_name = Some(ctx.text(field, "defName")?),
            "label" => label = Some(ctx.text(field, "label")?),
            "weapon" => weapon = Some((ctx.text(field, "weapon")?, ctx.origin(field))),
            "health" => {
                let value = ctx.number::<i32>(field, "health")?;
                if value <= 0 {
                    return Err(ctx.error(
                        ContentErrorCode::InvalidValue,
                        "health must be > 0".to_string(),
                        field,
                    ));
                }
                health = Some(value);
            }
            "evasion" => evasion = Some(ctx.float_in(field, "evasion", 0.0, 1.0)?),
            "armor" => armor = Some(ctx.number::<i32>(field, "armor")?),
            "penetrationBlock" => {
                penetration_block = Some(ctx.number::<i32>(field, "penetrationBlock")?)
            }
            "accuracy" => {
                stats.accuracy_multiplier = ctx.float_in(field, "accuracy", 0.0, 2.0)?
            }
            "moveTime" => stats.move_time = ctx.number(field, "moveTime")?,
            "attackTime" => stats.attack_time = ctx.number(field, "attackTime")?,
            "reloadTime" => stats.reload_time = ctx.number(field, "reloadTime")?,
            "viewRange" => stats.view_range = ctx.float_in(field, "viewRange", 0.0, 64.0)?,
            "viewAngle" => {
                stats.view_angle_degrees = ctx.float_in(field, "viewAngle", 0.0, 360.0)?
            }
            "avoidsHazards" => stats.avoids_hazards = ctx.boolean(field, "avoidsHazards")?,
            "idle" => {
                idle_behavior = ctx.token(field, "idle", "Wander, Stationary", |value| match value {
                    "Wander" => Some(IdleBehavior::Wander),
                    "Stationary" => Some(IdleBehavior::Stationary),
                    _ => None,
                })?
            }
            "conductive" => conductive = ctx.boolean(field, "conductive")?,
            "resistances" => resistances = parse_resistances(ctx, field)?,
            "powers" => powers = parse_powers(ctx, field)?,
            _ => return Err(ctx.unknown_field(field, DEF)),
        }
    }

    let def_name = ctx.missing(def_name, "defName", DEF, node)?;
    let label = ctx.missing(label, "label", DEF, node)?;
    let (weapon, weapon_origin) = ctx.missing(weapon, "weapon", DEF, node)?;
    let health = ctx.missing(health, "health", DEF, node)?;

    let mut damageable = Damageable::new(health).with_resistances(resistances);
    if let Some(evasion) = evasion {
        damageable = damageable.with_evasion(evasion);
    }
    if let Some(armor) = armor {
        damageable = damageable.with_armor(armor);
    }
    if let Some(block) = penetration_block {
        damageable = damageable.with_penetration_block(block);
    }

    Ok(PendingCreature {
        def_name,
        label,
        weapon,
        weapon_origin,
        damageable,
        stats,
        idle_behavior,
        conductive,
        powers,
    })
}

/// `<resistances><Heat>Resistant</Heat></resistances>`
fn parse_resistances(
    ctx: &DocContext<'_, '_>,
    node: Node<'_, '_>,
) -> Result<Resistances, ContentCompileError> {
    let mut seen = HashSet::<String>::new();
    let mut resistances = Resistances::default();
    for entry in node.children().filter(|child| child.is_element()) {
        let name = ctx.check_unique(&mut seen, entry, "resistances")?;
        let Some(damage_type) = DamageType::from_token(&name) else {
            return Err(ctx.error(
                ContentErrorCode::InvalidValue,
                format!("unknown damage type <{name}> in <resistances>"),
                entry,
            ));
        };
        let resistance = ctx.token(
            entry,
            &name,
            "Immune, Resistant, None, Vulnerable, VeryVulnerable",
            Resistance::from_token,
        )?;
        resistances.set(damage_type, resistance);
    }
    Ok(resistances)
}

/// `<powers><li level="2">fireball</li></powers>`
fn parse_powers(
    ctx: &DocContext<'_, '_>,
    node: Node<'_, '_>,
) -> Result<Vec<Power>, ContentCompileError> {
    let mut powers = Vec::new();
    for entry in node.children().filter(|child| child.is_element()) {
        if entry.tag_name().name() != "li" {
            return Err(ctx.unknown_field(entry, "powers"));
        }
        let kind = ctx.token(
            entry,
            "power",
            "fireball, lightning, blink, force_push, flood, trip_wire, regenerate, smoke_screen",
            PowerKind::from_token,
        )?;
        let level = match entry.attribute("level") {
            Some(raw) => raw.trim().parse::<u8>().map_err(|_| {
                ctx.error(
                    ContentErrorCode::InvalidValue,
                    format!("power level '{raw}' is not a valid number"),
                    entry,
                )
            })?,
            None => 1,
        };
        powers.push(Power::new(kind).at_level(level));
    }
    Ok(powers)
}

fn read_error(source_name: &str, error: ReadError) -> ContentCompileError {
    ContentCompileError {
        code: ContentErrorCode::ReadFile,
        message: format!("failed to read definitions: {}", error.source),
        source_name: source_name.to_string(),
        file_path: error.path,
        location: None,
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::world::Alignment;

    fn write_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(path, content).expect("write");
    }

    #[test]
    fn embedded_base_defs_compile_and_resolve() {
        let db = compile_base_defs().expect("base defs");
        assert!(!db.weapon_defs().is_empty());
        for def in db.creature_defs() {
            assert!(
                db.creature_spec(&def.def_name, Alignment::AgainstPlayer).is_some(),
                "{} does not resolve",
                def.def_name
            );
        }
    }

    #[test]
    fn ids_follow_def_name_order() {
        let db = compile_defs_str(
            "inline",
            r#"<Defs>
                <WeaponDef><defName>zz_spear</defName><label>Spear</label><kind>melee</kind><damage>5</damage></WeaponDef>
                <WeaponDef><defName>aa_club</defName><label>Club</label><kind>melee</kind><damage>4</damage></WeaponDef>
            </Defs>"#,
        )
        .expect("compile");
        let club = db.weapon_id_by_name("aa_club").expect("club");
        let spear = db.weapon_id_by_name("zz_spear").expect("spear");
        assert!(club.0 < spear.0);
    }

    #[test]
    fn missing_def_name_reports_source_and_location() {
        let err = compile_defs_str(
            "inline",
            r#"<Defs><WeaponDef><label>X</label><kind>gun</kind><damage>2</damage></WeaponDef></Defs>"#,
        )
        .expect_err("err");
        assert_eq!(err.code, ContentErrorCode::MissingField);
        assert_eq!(err.source_name, "inline");
        assert!(err.location.is_some());
    }

    #[test]
    fn unknown_field_and_invalid_token_are_rejected() {
        let err = compile_defs_str(
            "inline",
            r#"<Defs><WeaponDef><defName>a</defName><label>A</label><kind>melee</kind><damage>1</damage><mood>Happy</mood></WeaponDef></Defs>"#,
        )
        .expect_err("err");
        assert_eq!(err.code, ContentErrorCode::UnknownField);

        let err = compile_defs_str(
            "inline",
            r#"<Defs><WeaponDef><defName>a</defName><label>A</label><kind>laser</kind><damage>1</damage></WeaponDef></Defs>"#,
        )
        .expect_err("err");
        assert_eq!(err.code, ContentErrorCode::InvalidValue);
    }

    #[test]
    fn malformed_xml_reports_location() {
        let err = compile_defs_str("inline", r#"<Defs><WeaponDef><defName>a</defName></Defs>"#)
            .expect_err("err");
        assert_eq!(err.code, ContentErrorCode::XmlMalformed);
        assert!(err.location.is_some());
    }

    #[test]
    fn unknown_weapon_reference_points_at_the_field() {
        let err = compile_defs_str(
            "inline",
            r#"<Defs>
<CreatureDef><defName>ghost</defName><label>Ghost</label><health>5</health>
<weapon>phantom_blade</weapon></CreatureDef>
</Defs>"#,
        )
        .expect_err("err");
        assert_eq!(err.code, ContentErrorCode::UnresolvedReference);
        assert_eq!(err.location.map(|loc| loc.line), Some(3));
    }

    #[test]
    fn creature_fields_reach_the_spawn_spec() {
        let db = compile_defs_str(
            "inline",
            r#"<Defs>
                <WeaponDef><defName>torch</defName><label>Torch</label><kind>melee</kind><damage>4</damage><damageType>Heat</damageType></WeaponDef>
                <CreatureDef>
                    <defName>salamander</defName><label>Salamander</label><weapon>torch</weapon>
                    <health>40</health><evasion>0.5</evasion>
                    <resistances><Heat>Immune</Heat><Cold>Vulnerable</Cold></resistances>
                    <powers><li level="2">fireball</li></powers>
                    <idle>Wander</idle>
                </CreatureDef>
            </Defs>"#,
        )
        .expect("compile");
        let id = db.creature_id_by_name("salamander").expect("id");
        let def = db.creature_def(id).expect("def");
        assert_eq!(def.damageable.max_health, 40);
        assert_eq!(def.damageable.evasion, Some(0.5));
        assert_eq!(def.damageable.resistances.get(DamageType::Heat), Resistance::Immune);
        assert_eq!(def.powers[0].level(), 2);
        assert_eq!(def.idle_behavior, IdleBehavior::Wander);
    }

    #[test]
    fn later_directory_overrides_earlier_by_def_name() {
        let temp = TempDir::new().expect("temp");
        let first = temp.path().join("first");
        let second = temp.path().join("second");
        write_file(
            &first.join("weapons.xml"),
            r#"<Defs><WeaponDef><defName>pike</defName><label>Pike</label><kind>melee</kind><damage>5</damage></WeaponDef></Defs>"#,
        );
        write_file(
            &second.join("weapons.xml"),
            r#"<Defs><WeaponDef><defName>pike</defName><label>Long Pike</label><kind>melee</kind><damage>9</damage></WeaponDef></Defs>"#,
        );
        let db = compile_def_dirs(&[first, second]).expect("compile");
        let weapon = db.weapon("pike").expect("pike");
        assert_eq!(weapon.damage, 9);
        assert_eq!(weapon.name, "Long Pike");
    }

    #[test]
    fn same_source_duplicate_def_errors() {
        let temp = TempDir::new().expect("temp");
        let dir = temp.path().join("dupes");
        write_file(
            &dir.join("a.xml"),
            r#"<Defs><WeaponDef><defName>pike</defName><label>Pike</label><kind>melee</kind><damage>5</damage></WeaponDef></Defs>"#,
        );
        write_file(
            &dir.join("b.xml"),
            r#"<Defs><WeaponDef><defName>pike</defName><label>Pike</label><kind>melee</kind><damage>6</damage></WeaponDef></Defs>"#,
        );
        let err = compile_def_dirs(&[dir]).expect_err("err");
        assert_eq!(err.code, ContentErrorCode::DuplicateDefInSource);
        assert_eq!(err.source_name, "dupes");
        assert!(err.file_path.ends_with("b.xml"));
    }

    #[test]
    fn missing_directory_is_a_read_error() {
        let temp = TempDir::new().expect("temp");
        let err = compile_def_dirs(&[temp.path().join("absent")]).expect_err("err");
        assert_eq!(err.code, ContentErrorCode::ReadFile);
    }
}
