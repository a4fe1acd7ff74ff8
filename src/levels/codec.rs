//! Integer-array encodings of the level order and the per-level checks.
//!
//! Sorting array: four entries, position = slot, value = one-based level
//! constant (Company=1, Type=2, Continent=3, Country=4).
//!
//! Filters array: eleven 0/1 entries. The four sortable levels sit at their
//! current slot, the seven fixed levels at their database index (4..=10).

use crate::error::TreeError;
use crate::levels::model::{Level, LevelChecks, OptionIndices};

pub const FILTERS_LEN: usize = Level::COUNT;

/// Encode which level occupies each of the first four slots.
pub fn sorting_value(indices: &OptionIndices) -> [u8; 4] {
    let mut levels = [0; 4];
    for level in Level::SORTABLE {
        if let Some(cell) = indices.slot(level).and_then(|s| levels.get_mut(s)) {
            *cell = level.database_level();
        }
    }
    levels
}

/// Slots recovered from a sorting array; `None` where a level is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodedIndices {
    pub continent: Option<usize>,
    pub country: Option<usize>,
    pub kind: Option<usize>,
    pub company: Option<usize>,
}

impl DecodedIndices {
    /// All four slots, if present and forming a permutation.
    pub fn complete(&self) -> Option<OptionIndices> {
        let indices = OptionIndices {
            continent: self.continent?,
            country: self.country?,
            kind: self.kind?,
            company: self.company?,
        };
        indices.is_valid().then_some(indices)
    }
}

/// Inverse of [`sorting_value`]: each level's slot is where its constant sits.
pub fn option_indices(values: &[u8]) -> DecodedIndices {
    let find = |level: Level| values.iter().position(|&v| v == level.database_level());
    DecodedIndices {
        continent: find(Level::Continent),
        country: find(Level::Country),
        kind: find(Level::Type),
        company: find(Level::Company),
    }
}

/// Place Type and Company; Continent and Country take the remaining slots
/// in ascending order.
pub fn generate_option_indices(
    type_slot: usize,
    company_slot: usize,
) -> Result<OptionIndices, TreeError> {
    if type_slot > 3 || company_slot > 3 || type_slot == company_slot {
        return Err(TreeError::InvalidSlots {
            type_slot,
            company_slot,
        });
    }
    let mut free = (0..4).filter(|s| *s != type_slot && *s != company_slot);
    match (free.next(), free.next()) {
        (Some(continent), Some(country)) => Ok(OptionIndices {
            continent,
            country,
            kind: type_slot,
            company: company_slot,
        }),
        _ => Err(TreeError::InvalidSlots {
            type_slot,
            company_slot,
        }),
    }
}

/// Drop a draggable level onto `target_slot`.
///
/// The level is lifted out of the order and reinserted at the target, so the
/// other draggable level shifts one slot toward the vacated position instead
/// of colliding. Non-draggable levels leave the order untouched.
pub fn move_level(indices: &OptionIndices, level: Level, target_slot: usize) -> OptionIndices {
    if !level.is_draggable() || !indices.is_valid() {
        return *indices;
    }
    let mut order = indices.order().to_vec();
    if let Some(from) = order.iter().position(|l| *l == level) {
        let moved = order.remove(from);
        order.insert(target_slot.min(order.len()), moved);
    }
    let slot_of = |wanted: Level| order.iter().position(|l| *l == wanted);
    match (slot_of(Level::Type), slot_of(Level::Company)) {
        (Some(kind), Some(company)) => generate_option_indices(kind, company).unwrap_or(*indices),
        _ => *indices,
    }
}

/// Eleven 0/1 flags; length is fixed regardless of input.
pub fn filters_value(indices: &OptionIndices, checks: &LevelChecks) -> [u8; FILTERS_LEN] {
    let mut filters = [0; FILTERS_LEN];
    for level in Level::SORTABLE {
        if let Some(cell) = indices.slot(level).and_then(|s| filters.get_mut(s)) {
            *cell = u8::from(checks[level]);
        }
    }
    for level in Level::FIXED {
        filters[level.database_index()] = u8::from(checks[level]);
    }
    filters
}

/// Inverse of [`filters_value`] for a given slot assignment.
pub fn decode_filters(values: &[u8], indices: &OptionIndices) -> Option<LevelChecks> {
    if values.len() != FILTERS_LEN {
        return None;
    }
    let mut checks = LevelChecks::default();
    for level in Level::ALL {
        let position = indices.slot(level).unwrap_or(level.database_index());
        checks.set(level, *values.get(position)? == 1);
    }
    Some(checks)
}

/// Comma-joined, optionally wrapped in `[` `]`.
pub fn format_array(values: &[u8], bracketed: bool) -> String {
    let joined = values
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(",");
    if bracketed {
        format!("[{}]", joined)
    } else {
        joined
    }
}

/// Accepts both the bare and the bracketed form; whitespace is ignored.
pub fn parse_array(text: &str) -> Result<Vec<u8>, TreeError> {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(trimmed)
        .trim();
    if inner.is_empty() {
        return Ok(Vec::new());
    }
    inner
        .split(',')
        .map(|v| {
            v.trim()
                .parse::<u8>()
                .map_err(|_| TreeError::InvalidArray(text.to_string()))
        })
        .collect()
}
