//! Chapter configuration.
//!
//! A chapter is described by one strongly-typed [`ChapterConfig`], usually
//! deserialized from JSON. Validation happens once, in
//! [`ChapterConfig::build_world`], which turns the description into an
//! immutable [`ChapterWorld`]: the walkability oracle, the start cell and the
//! player's spawn point. Nothing downstream re-reads or re-validates config.
//!
//! # Example
//!
//! ```
//! use isoworld_core::config::ChapterCatalog;
//!
//! let catalog = ChapterCatalog::from_json(r#"[
//!     {
//!         "id": "meadow",
//!         "map": { "kind": "rows", "rows": ["....", "....", "...."] },
//!         "start": [1, 1]
//!     }
//! ]"#).unwrap();
//!
//! let world = catalog.load("meadow").unwrap();
//! assert_eq!(world.grid().width(), 4);
//! assert!(catalog.load("swamp").is_err());
//! ```

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};
use terra::{
    Boundary, BoundaryError, CoordinateTransform, GridError, GridMap, RandomWalkConfig,
    TileGeometry, TileGeometryError, WalkabilityOracle,
};
use thiserror::Error;
use tracing::info;

/// Errors raised while loading chapter configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No chapter with this id exists in the catalog.
    #[error("chapter not found: {id}")]
    ChapterNotFound {
        /// The requested id
        id: String,
    },
    /// The JSON could not be parsed into the config schema.
    #[error("failed to parse chapter config: {0}")]
    Parse(#[from] serde_json::Error),
    /// The map could not be built.
    #[error("invalid map: {0}")]
    Grid(#[from] GridError),
    /// The boundary rectangle is malformed.
    #[error("invalid boundary: {0}")]
    Boundary(#[from] BoundaryError),
    /// The tile geometry is malformed.
    #[error("invalid tile geometry: {0}")]
    Tile(#[from] TileGeometryError),
    /// A field is out of range.
    #[error("invalid config field `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending field
        field: String,
        /// What is wrong with it
        reason: String,
    },
}

impl ConfigError {
    fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Where a chapter's grid comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MapSource {
    /// Literal text rows (`.`/`0` walkable, `#`/`1` blocked)
    Rows {
        /// One string per grid row
        rows: Vec<String>,
    },
    /// The legacy seeded random-walk generator
    RandomWalk(RandomWalkConfig),
}

impl MapSource {
    /// Build the grid this source describes.
    ///
    /// # Errors
    ///
    /// Returns [`GridError`] if the rows are malformed or the generator
    /// parameters are out of range.
    pub fn build(&self) -> Result<GridMap, GridError> {
        match self {
            Self::Rows { rows } => GridMap::from_rows(rows),
            Self::RandomWalk(config) => config.generate(),
        }
    }
}

/// Collision sampling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Downward offset from an entity's anchor to its foot point
    pub y_offset: f32,
    /// Neighbourhood tolerance, in cells, for player collision queries
    pub allowance: u32,
    /// Blend player input along open isometric diagonals near walls
    pub enable_iso_input: bool,
}

/// Player parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Speed in world units per baseline frame
    pub speed: f32,
    /// World-space spawn point; defaults to the centre of the start cell
    pub spawn: Option<Vec2>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            speed: 3.0,
            spawn: None,
        }
    }
}

/// Upper bound on [`SpawnConfig::target_count`].
pub const MAX_TARGET_COUNT: u32 = 10_000;

/// Monster population parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Number of live monsters the registry maintains
    pub target_count: u32,
    /// Seconds between refill attempts while under target
    pub regen_interval: f32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            target_count: 0,
            regen_interval: 10.0,
        }
    }
}

/// One kind of monster a chapter can spawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterArchetype {
    /// Unique id within the chapter
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Speed in world units per baseline frame
    pub move_speed: f32,
    /// Distance at which an auto-attacking monster engages the player
    #[serde(default)]
    pub detection_range: f32,
    /// Seconds before this monster kind comes back after dying
    #[serde(default)]
    pub regen_time: f32,
    /// Attack the player automatically when in range
    #[serde(default)]
    pub auto_attack: bool,
}

impl Default for MonsterArchetype {
    fn default() -> Self {
        Self {
            id: "slime".to_string(),
            name: "Slime".to_string(),
            move_speed: 1.0,
            detection_range: 150.0,
            regen_time: 10.0,
            auto_attack: false,
        }
    }
}

/// Complete description of one chapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterConfig {
    /// Unique chapter id
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Grid source
    pub map: MapSource,
    /// Designated start cell; must be walkable
    pub start: IVec2,
    /// Tile geometry for the isometric transform
    #[serde(default)]
    pub tile: TileGeometry,
    /// Optional world-space boundary (switches walkability to boundary mode)
    #[serde(default)]
    pub boundary: Option<Boundary>,
    /// Collision sampling
    #[serde(default)]
    pub collision: CollisionConfig,
    /// Player parameters
    #[serde(default)]
    pub player: PlayerConfig,
    /// Monster population
    #[serde(default)]
    pub spawn: SpawnConfig,
    /// Monster kinds available to the spawner
    #[serde(default)]
    pub monsters: Vec<MonsterArchetype>,
}

fn require_non_negative(field: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            field,
            format!("must be finite and non-negative, got {value}"),
        ))
    }
}

impl ChapterConfig {
    /// Parse a single chapter from JSON and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and any validation
    /// error from [`ChapterConfig::validate`].
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every range constraint that does not require building the map.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id.trim().is_empty() {
            return Err(ConfigError::invalid("id", "must not be empty"));
        }
        self.tile.validate()?;
        if let Some(boundary) = &self.boundary {
            boundary.validate()?;
        }
        if !self.collision.y_offset.is_finite() {
            return Err(ConfigError::invalid("collision.y_offset", "must be finite"));
        }
        require_non_negative("player.speed", self.player.speed)?;
        if let Some(spawn) = self.player.spawn {
            if !spawn.is_finite() {
                return Err(ConfigError::invalid("player.spawn", "must be finite"));
            }
        }
        if self.spawn.target_count > MAX_TARGET_COUNT {
            return Err(ConfigError::invalid(
                "spawn.target_count",
                format!(
                    "must be at most {MAX_TARGET_COUNT}, got {}",
                    self.spawn.target_count
                ),
            ));
        }
        if self.spawn.target_count > 0
            && !(self.spawn.regen_interval.is_finite() && self.spawn.regen_interval > 0.0)
        {
            return Err(ConfigError::invalid(
                "spawn.regen_interval",
                format!(
                    "must be positive when target_count > 0, got {}",
                    self.spawn.regen_interval
                ),
            ));
        }

        let mut seen = BTreeSet::new();
        for (index, archetype) in self.monsters.iter().enumerate() {
            if archetype.id.trim().is_empty() {
                return Err(ConfigError::invalid(
                    format!("monsters[{index}].id"),
                    "must not be empty",
                ));
            }
            if !seen.insert(archetype.id.as_str()) {
                return Err(ConfigError::invalid(
                    format!("monsters[{index}].id"),
                    format!("duplicate archetype id {:?}", archetype.id),
                ));
            }
            require_non_negative(&format!("monsters[{index}].move_speed"), archetype.move_speed)?;
            require_non_negative(
                &format!("monsters[{index}].detection_range"),
                archetype.detection_range,
            )?;
            require_non_negative(&format!("monsters[{index}].regen_time"), archetype.regen_time)?;
        }
        Ok(())
    }

    /// Validate and build the immutable world for this chapter.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if validation fails, the map cannot be built,
    /// or the start cell is missing or blocked.
    pub fn build_world(&self) -> Result<ChapterWorld, ConfigError> {
        self.validate()?;
        let transform = CoordinateTransform::new(self.tile)?;
        let grid = self.map.build()?;
        grid.ensure_walkable_start(self.start)?;
        let walkable = grid.walkable_count();
        if self.spawn.target_count as usize > walkable {
            return Err(ConfigError::invalid(
                "spawn.target_count",
                format!(
                    "exceeds the {walkable} walkable cells of the map, got {}",
                    self.spawn.target_count
                ),
            ));
        }

        let oracle = match self.boundary {
            Some(boundary) => WalkabilityOracle::bounded(transform, boundary, Some(grid.clone())),
            None => WalkabilityOracle::grid(transform, grid.clone()),
        };
        let player_spawn = self
            .player
            .spawn
            .unwrap_or_else(|| transform.cell_to_world(self.start));

        let world = ChapterWorld {
            config: self.clone(),
            grid,
            oracle,
            player_spawn,
        };
        info!(
            chapter = %self.id,
            width = world.grid().width(),
            height = world.grid().height(),
            boundary_mode = self.boundary.is_some(),
            archetypes = self.monsters.len(),
            "chapter_loaded"
        );
        Ok(world)
    }
}

/// The immutable, validated form of a chapter.
///
/// Built once by [`ChapterConfig::build_world`] and shared read-only with
/// every simulation component.
#[derive(Debug, Clone)]
pub struct ChapterWorld {
    config: ChapterConfig,
    grid: GridMap,
    oracle: WalkabilityOracle,
    player_spawn: Vec2,
}

impl ChapterWorld {
    /// The configuration this world was built from.
    #[must_use]
    pub fn config(&self) -> &ChapterConfig {
        &self.config
    }

    /// The walkability oracle.
    #[must_use]
    pub fn oracle(&self) -> &WalkabilityOracle {
        &self.oracle
    }

    /// The coordinate transform.
    #[must_use]
    pub fn transform(&self) -> &CoordinateTransform {
        self.oracle.transform()
    }

    /// The chapter grid.
    #[must_use]
    pub fn grid(&self) -> &GridMap {
        &self.grid
    }

    /// The boundary, when the chapter has one.
    #[must_use]
    pub fn boundary(&self) -> Option<&Boundary> {
        self.oracle.boundary()
    }

    /// The designated start cell.
    #[must_use]
    pub fn start_cell(&self) -> IVec2 {
        self.config.start
    }

    /// World-space point where the player appears.
    #[must_use]
    pub fn player_spawn(&self) -> Vec2 {
        self.player_spawn
    }
}

/// All chapters known to the game, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct ChapterCatalog {
    chapters: BTreeMap<String, ChapterConfig>,
}

impl ChapterCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON array of chapters, validating each.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on malformed JSON, invalid chapters, or
    /// duplicate chapter ids.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let chapters: Vec<ChapterConfig> = serde_json::from_str(json)?;
        let mut catalog = Self::new();
        for chapter in chapters {
            catalog.insert(chapter)?;
        }
        Ok(catalog)
    }

    /// Validate and add a chapter.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the chapter is invalid or its id is taken.
    pub fn insert(&mut self, chapter: ChapterConfig) -> Result<(), ConfigError> {
        chapter.validate()?;
        if self.chapters.contains_key(&chapter.id) {
            return Err(ConfigError::invalid(
                "id",
                format!("duplicate chapter id {:?}", chapter.id),
            ));
        }
        self.chapters.insert(chapter.id.clone(), chapter);
        Ok(())
    }

    /// Look up a chapter by id.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ChapterNotFound`] for unknown ids.
    pub fn get(&self, id: &str) -> Result<&ChapterConfig, ConfigError> {
        self.chapters
            .get(id)
            .ok_or_else(|| ConfigError::ChapterNotFound { id: id.to_string() })
    }

    /// Look up a chapter and build its world.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ChapterNotFound`] for unknown ids and any
    /// error from [`ChapterConfig::build_world`].
    pub fn load(&self, id: &str) -> Result<ChapterWorld, ConfigError> {
        self.get(id)?.build_world()
    }

    /// Chapter ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.chapters.keys().map(String::as_str)
    }

    /// Number of chapters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    /// Returns `true` if there are no chapters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }
}

/// Simulation loop parameters supplied by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Largest frame delta the loop accepts, in seconds. `None` leaves the
    /// host's delta uncapped.
    pub max_frame_delta: Option<f32>,
    /// Seed for spawn placement and AI randomness
    pub seed: u64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_frame_delta: None,
            seed: 0,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
