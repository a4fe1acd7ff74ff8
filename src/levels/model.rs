use std::fmt;
use std::ops::Index;
use std::str::FromStr;

/// One tier of the fixed eleven-tier hierarchy, in database order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Level {
    Company,
    Type,
    Continent,
    Country,
    Region,
    Block,
    ProductionStation,
    Field,
    Reservoir,
    Well,
    Completion,
}

impl Level {
    pub const COUNT: usize = 11;

    pub const ALL: [Level; Level::COUNT] = [
        Level::Company,
        Level::Type,
        Level::Continent,
        Level::Country,
        Level::Region,
        Level::Block,
        Level::ProductionStation,
        Level::Field,
        Level::Reservoir,
        Level::Well,
        Level::Completion,
    ];

    /// The four levels whose order among the first four slots can change.
    pub const SORTABLE: [Level; 4] = [Level::Company, Level::Type, Level::Continent, Level::Country];

    /// Levels that never move.
    pub const FIXED: [Level; 7] = [
        Level::Region,
        Level::Block,
        Level::ProductionStation,
        Level::Field,
        Level::Reservoir,
        Level::Well,
        Level::Completion,
    ];

    /// Zero-based position in the filters array.
    pub fn database_index(self) -> usize {
        self as usize
    }

    /// One-based level constant written to the sorting array.
    pub fn database_level(self) -> u8 {
        self as u8 + 1
    }

    /// Only these two are moved by the user; continent and country follow.
    pub fn is_draggable(self) -> bool {
        matches!(self, Level::Type | Level::Company)
    }

    /// Node type key used by the data source for this level.
    pub fn type_key(self) -> &'static str {
        match self {
            Level::Company => "company_id",
            Level::Type => "operated_id",
            Level::Continent => "continent_id",
            Level::Country => "country_id",
            Level::Region => "region_id",
            Level::Block => "block_id",
            Level::ProductionStation => "productionstation_id",
            Level::Field => "field_id",
            Level::Reservoir => "reservoir_id",
            Level::Well => "well_id",
            Level::Completion => "completion_id",
        }
    }

    pub fn from_type_key(key: &str) -> Option<Level> {
        Level::ALL.into_iter().find(|l| l.type_key() == key)
    }

    pub fn label(self) -> &'static str {
        match self {
            Level::Company => "Company",
            Level::Type => "Type",
            Level::Continent => "Continent",
            Level::Country => "Country",
            Level::Region => "Region",
            Level::Block => "Block",
            Level::ProductionStation => "Production Station",
            Level::Field => "Field",
            Level::Reservoir => "Reservoir",
            Level::Well => "Well",
            Level::Completion => "Completion",
        }
    }

    fn slug(self) -> &'static str {
        match self {
            Level::Company => "company",
            Level::Type => "type",
            Level::Continent => "continent",
            Level::Country => "country",
            Level::Region => "region",
            Level::Block => "block",
            Level::ProductionStation => "production-station",
            Level::Field => "field",
            Level::Reservoir => "reservoir",
            Level::Well => "well",
            Level::Completion => "completion",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Level::ALL
            .into_iter()
            .find(|l| l.slug() == wanted || (wanted == "operated" && *l == Level::Type))
            .ok_or_else(|| format!("unknown level `{}`", s))
    }
}

/// Slot (0..=3) currently occupied by each sortable level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionIndices {
    pub continent: usize,
    pub country: usize,
    pub kind: usize,
    pub company: usize,
}

impl Default for OptionIndices {
    /// Continent, Country, Type, Company.
    fn default() -> Self {
        Self {
            continent: 0,
            country: 1,
            kind: 2,
            company: 3,
        }
    }
}

impl OptionIndices {
    pub fn slot(&self, level: Level) -> Option<usize> {
        match level {
            Level::Continent => Some(self.continent),
            Level::Country => Some(self.country),
            Level::Type => Some(self.kind),
            Level::Company => Some(self.company),
            _ => None,
        }
    }

    /// Whether the four slots form a permutation of `0..4`.
    pub fn is_valid(&self) -> bool {
        let mut seen = [false; 4];
        for slot in [self.continent, self.country, self.kind, self.company] {
            match seen.get_mut(slot) {
                Some(s) if !*s => *s = true,
                _ => return false,
            }
        }
        true
    }

    /// Sortable levels listed by slot.
    pub fn order(&self) -> [Level; 4] {
        let mut order = Level::SORTABLE;
        for level in Level::SORTABLE {
            if let Some(cell) = self.slot(level).and_then(|s| order.get_mut(s)) {
                *cell = level;
            }
        }
        order
    }
}

/// Per-level on/off flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelChecks {
    flags: [bool; Level::COUNT],
}

impl Default for LevelChecks {
    fn default() -> Self {
        Self {
            flags: [true; Level::COUNT],
        }
    }
}

impl LevelChecks {
    pub fn set(&mut self, level: Level, on: bool) {
        self.flags[level.database_index()] = on;
    }

    pub fn toggle(&mut self, level: Level) {
        let flag = &mut self.flags[level.database_index()];
        *flag = !*flag;
    }
}

impl Index<Level> for LevelChecks {
    type Output = bool;

    fn index(&self, level: Level) -> &bool {
        &self.flags[level.database_index()]
    }
}
