//! Table structure validation
//!
//! A tagged table must follow the schema `Table → TR → {TH, TD}`. Elements
//! arrive in traversal order and [`TableStructure::add`] tracks the nesting
//! level between consecutive elements. A move that is neither a descent to a
//! child type, a step to a sibling of the same type, nor an ascent to the
//! parent type makes the table invalid for good.
//!
//! The state machine is generic over the element identity so it can be
//! driven by document object ids as well as plain test values.

use std::fmt;

/// Structure types taking part in a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableTag {
    Table,
    Row,
    Header,
    Data,
}

impl TableTag {
    /// Map a structure type name (`Table`, `TR`, `TH`, `TD`) to its tag.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Table" => Some(TableTag::Table),
            "TR" => Some(TableTag::Row),
            "TH" => Some(TableTag::Header),
            "TD" => Some(TableTag::Data),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TableTag::Table => "Table",
            TableTag::Row => "TR",
            TableTag::Header => "TH",
            TableTag::Data => "TD",
        }
    }

    /// The type an element of this type must sit under.
    pub fn parent(self) -> Option<TableTag> {
        match self {
            TableTag::Table => None,
            TableTag::Row => Some(TableTag::Table),
            TableTag::Header | TableTag::Data => Some(TableTag::Row),
        }
    }

    pub fn children(self) -> &'static [TableTag] {
        match self {
            TableTag::Table => &[TableTag::Row],
            TableTag::Row => &[TableTag::Header, TableTag::Data],
            TableTag::Header | TableTag::Data => &[],
        }
    }
}

impl fmt::Display for TableTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raised by the transition that invalidates a table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid table structure: {to} cannot follow {from}")]
pub struct InvalidTableStructure {
    pub from: TableTag,
    pub to: TableTag,
}

/// Whether [`TableStructure::add`] changed the tracked position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Applied,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TableState<K> {
    Empty,
    Tracking {
        current: (K, TableTag),
        previous: Option<(K, TableTag)>,
        level: i32,
    },
    Invalid,
}

/// Validation state of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStructure<K> {
    state: TableState<K>,
    page: u32,
}

impl<K> Default for TableStructure<K> {
    fn default() -> Self {
        Self {
            state: TableState::Empty,
            page: 0,
        }
    }
}

impl<K: Clone + PartialEq> TableStructure<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next element of the table.
    ///
    /// A `Table` element restarts tracking from itself. An element equal to
    /// the previous one is ignored, as is anything once the table is invalid.
    pub fn add(&mut self, key: K, tag: TableTag) -> Result<AddOutcome, InvalidTableStructure> {
        if tag == TableTag::Table {
            self.state = TableState::Tracking {
                current: (key, tag),
                previous: None,
                level: 0,
            };
            return Ok(AddOutcome::Skipped);
        }

        let TableState::Tracking {
            current,
            previous,
            level,
        } = &mut self.state
        else {
            return Ok(AddOutcome::Skipped);
        };

        if previous.as_ref().is_some_and(|(prev, _)| *prev == key) {
            return Ok(AddOutcome::Skipped);
        }

        let from = current.1;
        let delta = if tag.parent() == Some(from) {
            1
        } else if from == tag {
            0
        } else if tag.children().contains(&from) {
            -1
        } else {
            self.state = TableState::Invalid;
            return Err(InvalidTableStructure { from, to: tag });
        };

        *level += delta;
        *previous = Some(std::mem::replace(current, (key, tag)));
        Ok(AddOutcome::Applied)
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self.state, TableState::Invalid)
    }

    /// Nesting level relative to the `Table` element, `None` when not tracking.
    pub fn level(&self) -> Option<i32> {
        match &self.state {
            TableState::Tracking { level, .. } => Some(*level),
            _ => None,
        }
    }

    /// Page holding the table, 0 when unknown.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Record the page once; later calls keep the first non-zero value.
    pub fn set_page(&mut self, page: u32) {
        if self.page == 0 {
            self.page = page;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(tags: &[(u32, TableTag)]) -> (TableStructure<u32>, Vec<AddOutcome>) {
        let mut table = TableStructure::new();
        table.add(0, TableTag::Table).unwrap();
        let outcomes = tags
            .iter()
            .filter_map(|(key, tag)| table.add(*key, *tag).ok())
            .collect();
        (table, outcomes)
    }

    #[test]
    fn test_tag_names() {
        assert_eq!(TableTag::from_name("TR"), Some(TableTag::Row));
        assert_eq!(TableTag::from_name("THead"), None);
        assert_eq!(TableTag::Data.to_string(), "TD");
    }

    #[test]
    fn test_well_formed_table_levels() {
        let mut table = TableStructure::new();
        assert_eq!(table.add(0, TableTag::Table), Ok(AddOutcome::Skipped));
        assert_eq!(table.level(), Some(0));

        table.add(1, TableTag::Row).unwrap();
        assert_eq!(table.level(), Some(1));

        table.add(2, TableTag::Header).unwrap();
        assert_eq!(table.level(), Some(2));

        table.add(3, TableTag::Header).unwrap();
        assert_eq!(table.level(), Some(2));

        table.add(4, TableTag::Row).unwrap();
        assert_eq!(table.level(), Some(1));

        table.add(5, TableTag::Data).unwrap();
        assert_eq!(table.level(), Some(2));
        assert!(!table.is_invalid());
    }

    #[test]
    fn test_cell_directly_under_table_is_invalid() {
        let mut table = TableStructure::new();
        table.add(0, TableTag::Table).unwrap();

        let err = table.add(1, TableTag::Data).unwrap_err();
        assert_eq!(
            err,
            InvalidTableStructure {
                from: TableTag::Table,
                to: TableTag::Data
            }
        );
        assert!(table.is_invalid());
        assert_eq!(table.level(), None);
    }

    #[test]
    fn test_invalid_is_sticky() {
        let (mut table, _) = table_with(&[(1, TableTag::Header)]);
        assert!(table.is_invalid());
        assert_eq!(table.add(2, TableTag::Row), Ok(AddOutcome::Skipped));
        assert!(table.is_invalid());
    }

    #[test]
    fn test_repeated_previous_element_is_skipped() {
        let (table, outcomes) = table_with(&[
            (1, TableTag::Row),
            (2, TableTag::Data),
            (1, TableTag::Row),
        ]);
        assert_eq!(
            outcomes,
            vec![AddOutcome::Applied, AddOutcome::Applied, AddOutcome::Skipped]
        );
        assert_eq!(table.level(), Some(2));
    }

    #[test]
    fn test_add_before_table_is_skipped() {
        let mut table: TableStructure<u32> = TableStructure::new();
        assert_eq!(table.add(1, TableTag::Row), Ok(AddOutcome::Skipped));
        assert_eq!(table.level(), None);
    }

    #[test]
    fn test_table_restarts_tracking() {
        let (mut table, _) = table_with(&[(1, TableTag::Row), (2, TableTag::Data)]);
        table.add(9, TableTag::Table).unwrap();
        assert_eq!(table.level(), Some(0));
    }

    #[test]
    fn test_page_is_set_once() {
        let mut table: TableStructure<u32> = TableStructure::new();
        assert_eq!(table.page(), 0);
        table.set_page(4);
        table.set_page(7);
        assert_eq!(table.page(), 4);
    }
}
