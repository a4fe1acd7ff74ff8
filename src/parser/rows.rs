//! Path rows: `level(,level)*` where `level = id(:name(:type)?)?`.
//!
//! Every row is one full path from a root to a leaf. Nothing is trimmed;
//! ids and names are taken verbatim after splitting.

/// One parsed level of a path row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelRecord {
    pub id: String,
    pub name: String,
    pub kind: String,
}

impl LevelRecord {
    /// Parse `id[:name[:type]]`; name and type fall back to the id.
    pub fn parse(column: &str) -> Self {
        let mut parts = column.split(':');
        let id = parts.next().unwrap_or_default().to_string();
        let name = parts.next().map(str::to_string).unwrap_or_else(|| id.clone());
        let kind = parts.next().map(str::to_string).unwrap_or_else(|| id.clone());
        Self { id, name, kind }
    }
}

/// Row-major table of parsed levels.
pub type PathTable = Vec<Vec<LevelRecord>>;

/// Split one row into its levels. An empty row has no levels.
pub fn parse_row(row: &str) -> Vec<LevelRecord> {
    if row.is_empty() {
        return Vec::new();
    }
    row.split(',').map(LevelRecord::parse).collect()
}

pub fn parse_rows<S: AsRef<str>>(rows: &[S]) -> PathTable {
    rows.iter().map(|r| parse_row(r.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_only_defaults_name_and_type() {
        let rec = LevelRecord::parse("42");
        assert_eq!(rec.id, "42");
        assert_eq!(rec.name, "42");
        assert_eq!(rec.kind, "42");
    }

    #[test]
    fn id_name_type_columns() {
        let row = parse_row("1:Acme:company_id,7:Norway:country_id");
        assert_eq!(
            row,
            vec![
                LevelRecord {
                    id: "1".into(),
                    name: "Acme".into(),
                    kind: "company_id".into(),
                },
                LevelRecord {
                    id: "7".into(),
                    name: "Norway".into(),
                    kind: "country_id".into(),
                },
            ]
        );
    }

    #[test]
    fn id_name_defaults_type_to_id() {
        let rec = LevelRecord::parse("3:Troll");
        assert_eq!(rec.name, "Troll");
        assert_eq!(rec.kind, "3");
    }

    #[test]
    fn extra_fields_are_ignored() {
        let rec = LevelRecord::parse("3:Troll:field_id:extra");
        assert_eq!(rec.kind, "field_id");
    }

    #[test]
    fn no_whitespace_trimming() {
        let row = parse_row(" 1 , 2");
        assert_eq!(row[0].id, " 1 ");
        assert_eq!(row[1].id, " 2");
    }

    #[test]
    fn empty_input_is_empty_table() {
        let rows: [&str; 0] = [];
        assert!(parse_rows(&rows).is_empty());
        assert_eq!(parse_rows(&[""]), vec![Vec::new()]);
    }
}
