//! Table layout
//!
//! Grid view of an HTML table that honours rowspan/colspan, and the rule
//! deciding whether a header cell governs a row or a column.

use std::collections::HashSet;

use cf_dom::{DomTree, NodeId};

use crate::error::InvariantViolation;

const MAX_COLSPAN: usize = 1000;
const MAX_ROWSPAN: usize = 65534;

/// What a header cell covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderDirection {
    Row,
    Col,
}

fn is_cell(tree: &DomTree, node: NodeId) -> bool {
    matches!(tree.tag_name(node), Some("td" | "th"))
}

/// Direction of a header cell, `None` when the cell is not a header
///
/// A `td` heads its row when it is the row's first cell. A `th` follows its
/// `scope` attribute, then its section (`thead` heads columns), then the
/// presence of data cells in its row. The derived direction is written back
/// to `scope` so the row is only scanned once.
pub fn header_direction(tree: &mut DomTree, cell: NodeId) -> Option<HeaderDirection> {
    match tree.tag_name(cell) {
        Some("td") => {
            return match tree.prev_element_sibling(cell) {
                None => Some(HeaderDirection::Row),
                Some(_) => None,
            };
        }
        Some("th") => {}
        _ => return None,
    }

    match tree.attr(cell, "scope") {
        Some("col" | "colgroup") => return Some(HeaderDirection::Col),
        Some("row" | "rowgroup") => return Some(HeaderDirection::Row),
        _ => {}
    }

    let Some(row) = tree.parent_element(cell) else {
        return Some(HeaderDirection::Row);
    };
    if tree
        .parent_element(row)
        .is_some_and(|section| tree.is_tag(section, "thead"))
    {
        return Some(HeaderDirection::Col);
    }

    let has_data = tree.element_children(row).any(|c| tree.is_tag(c, "td"));
    let (direction, scope) = if has_data {
        (HeaderDirection::Row, "row")
    } else {
        (HeaderDirection::Col, "col")
    };
    tree.set_attr(cell, "scope", scope);
    Some(direction)
}

/// The table owning a cell, looking through row groups
pub fn table_of(tree: &DomTree, cell: NodeId) -> Option<NodeId> {
    let row = tree.parent_element(cell)?;
    let parent = tree.parent_element(row)?;
    match tree.tag_name(parent) {
        Some("thead" | "tbody" | "tfoot") => tree.parent_element(parent),
        _ => Some(parent),
    }
}

/// Cells of a table laid out on a grid
#[derive(Debug, Clone, Default)]
pub struct TableLayout {
    rows: Vec<NodeId>,
    content: Vec<Vec<Option<NodeId>>>,
}

impl TableLayout {
    pub fn build(tree: &DomTree, table: NodeId) -> Self {
        let rows = table_rows(tree, table);
        let mut content: Vec<Vec<Option<NodeId>>> = vec![Vec::new(); rows.len()];

        for (i, &row) in rows.iter().enumerate() {
            let mut j = 0;
            for cell in tree.element_children(row).filter(|&c| is_cell(tree, c)) {
                while content[i].get(j).copied().flatten().is_some() {
                    j += 1;
                }
                // Row spans stop at the last row of the table
                let height = rowspan(tree, cell).min(rows.len() - i);
                let width = colspan(tree, cell);
                for line in &mut content[i..i + height] {
                    if line.len() < j + width {
                        line.resize(j + width, None);
                    }
                    for slot in &mut line[j..j + width] {
                        *slot = Some(cell);
                    }
                }
                j += width;
            }
        }

        tracing::trace!(%table, rows = content.len(), "Built table layout");
        Self { rows, content }
    }

    /// Grid row where a cell starts
    pub fn base_row(&self, tree: &DomTree, cell: NodeId) -> Result<usize, InvariantViolation> {
        let row = tree
            .parent_element(cell)
            .ok_or(InvariantViolation::MissingParent(cell))?;
        self.rows
            .iter()
            .position(|&r| r == row)
            .ok_or(InvariantViolation::CellOutsideLayout(cell))
    }

    /// Grid column where a cell starts
    pub fn base_column(&self, tree: &DomTree, cell: NodeId) -> Result<usize, InvariantViolation> {
        let i = self.base_row(tree, cell)?;
        self.content[i]
            .iter()
            .position(|&c| c == Some(cell))
            .ok_or(InvariantViolation::CellOutsideLayout(cell))
    }

    /// Distinct cells in column `j`, top to bottom
    pub fn column_cells(&self, j: usize) -> Vec<NodeId> {
        dedup(self.content.iter().filter_map(|row| row.get(j).copied().flatten()))
    }

    /// Distinct cells in row `i`, left to right
    pub fn row_cells(&self, i: usize) -> Vec<NodeId> {
        match self.content.get(i) {
            Some(row) => dedup(row.iter().copied().flatten()),
            None => Vec::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.content.len()
    }

    pub fn column_count(&self) -> usize {
        self.content.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// Rows in `table.rows` order: head, body rows, foot
fn table_rows(tree: &DomTree, table: NodeId) -> Vec<NodeId> {
    let mut head = Vec::new();
    let mut body = Vec::new();
    let mut foot = Vec::new();
    for child in tree.element_children(table) {
        let section_rows = || tree.element_children(child).filter(|&r| tree.is_tag(r, "tr"));
        match tree.tag_name(child) {
            Some("tr") => body.push(child),
            Some("thead") => head.extend(section_rows()),
            Some("tbody") => body.extend(section_rows()),
            Some("tfoot") => foot.extend(section_rows()),
            _ => {}
        }
    }
    head.extend(body);
    head.extend(foot);
    head
}

/// Number of grid columns a cell covers
pub fn colspan(tree: &DomTree, cell: NodeId) -> usize {
    span(tree, cell, "colspan", MAX_COLSPAN)
}

/// Number of grid rows a cell covers
pub fn rowspan(tree: &DomTree, cell: NodeId) -> usize {
    span(tree, cell, "rowspan", MAX_ROWSPAN)
}

fn span(tree: &DomTree, cell: NodeId, attr: &str, max: usize) -> usize {
    tree.attr(cell, attr)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(1)
        .min(max)
}

fn dedup(cells: impl Iterator<Item = NodeId>) -> Vec<NodeId> {
    let mut seen = HashSet::new();
    cells.filter(|c| seen.insert(*c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a table from rows of `(tag, rowspan, colspan)` cells
    fn table(tree: &mut DomTree, rows: &[&[(&str, usize, usize)]]) -> (NodeId, Vec<Vec<NodeId>>) {
        let table = tree.create_element("table");
        let tbody = tree.create_element("tbody");
        tree.append_child(NodeId::ROOT, table).unwrap();
        tree.append_child(table, tbody).unwrap();
        let mut ids = Vec::new();
        for row in rows {
            let tr = tree.create_element("tr");
            tree.append_child(tbody, tr).unwrap();
            let mut line = Vec::new();
            for &(tag, rowspan, colspan) in row.iter() {
                let cell = tree.create_element(tag);
                if rowspan != 1 {
                    tree.set_attr(cell, "rowspan", &rowspan.to_string());
                }
                if colspan != 1 {
                    tree.set_attr(cell, "colspan", &colspan.to_string());
                }
                tree.append_child(tr, cell).unwrap();
                line.push(cell);
            }
            ids.push(line);
        }
        (table, ids)
    }

    #[test]
    fn test_spans_fill_grid() {
        let mut tree = DomTree::new();
        let (t, cells) = table(
            &mut tree,
            &[
                &[("th", 2, 1), ("th", 1, 2)],
                &[("td", 1, 1), ("td", 1, 1)],
            ],
        );
        let layout = TableLayout::build(&tree, t);

        assert_eq!(layout.row_count(), 2);
        assert_eq!(layout.column_count(), 3);
        assert_eq!(layout.base_column(&tree, cells[1][0]).unwrap(), 1);
        assert_eq!(layout.base_column(&tree, cells[1][1]).unwrap(), 2);
        assert_eq!(layout.column_cells(0), vec![cells[0][0]]);
        assert_eq!(layout.row_cells(0), vec![cells[0][0], cells[0][1]]);
        assert_eq!(layout.base_row(&tree, cells[1][1]).unwrap(), 1);
    }

    #[test]
    fn test_rowspan_is_clamped_to_table_rows() {
        let mut tree = DomTree::new();
        let (t, cells) = table(
            &mut tree,
            &[
                &[("th", 65534, 3), ("td", 1, 1)],
                &[("td", 1, 1)],
            ],
        );
        let layout = TableLayout::build(&tree, t);

        assert_eq!(layout.row_count(), 2);
        assert_eq!(layout.column_count(), 4);
        assert_eq!(layout.column_cells(0), vec![cells[0][0]]);
        assert_eq!(layout.base_column(&tree, cells[1][0]).unwrap(), 3);
        assert!(layout.row_cells(2).is_empty());
    }

    #[test]
    fn test_detached_cell_is_invariant_violation() {
        let mut tree = DomTree::new();
        let (t, _) = table(&mut tree, &[&[("td", 1, 1)]]);
        let layout = TableLayout::build(&tree, t);
        let stray = tree.create_element("td");
        assert_eq!(
            layout.base_row(&tree, stray),
            Err(InvariantViolation::MissingParent(stray))
        );
    }

    #[test]
    fn test_header_direction_rules() {
        let mut tree = DomTree::new();
        let (_, cells) = table(
            &mut tree,
            &[
                &[("th", 1, 1), ("th", 1, 1)],
                &[("th", 1, 1), ("td", 1, 1)],
                &[("td", 1, 1), ("td", 1, 1)],
            ],
        );

        assert_eq!(header_direction(&mut tree, cells[0][0]), Some(HeaderDirection::Col));
        assert_eq!(tree.attr(cells[0][0], "scope"), Some("col"));
        assert_eq!(header_direction(&mut tree, cells[1][0]), Some(HeaderDirection::Row));
        assert_eq!(tree.attr(cells[1][0], "scope"), Some("row"));
        assert_eq!(header_direction(&mut tree, cells[2][0]), Some(HeaderDirection::Row));
        assert_eq!(header_direction(&mut tree, cells[2][1]), None);

        tree.set_attr(cells[0][1], "scope", "rowgroup");
        assert_eq!(header_direction(&mut tree, cells[0][1]), Some(HeaderDirection::Row));
    }

    #[test]
    fn test_thead_heads_columns() {
        let mut tree = DomTree::new();
        let table = tree.create_element("table");
        let thead = tree.create_element("thead");
        let tr = tree.create_element("tr");
        let th = tree.create_element("th");
        let td = tree.create_element("td");
        tree.append_child(NodeId::ROOT, table).unwrap();
        tree.append_child(table, thead).unwrap();
        tree.append_child(thead, tr).unwrap();
        tree.append_child(tr, th).unwrap();
        tree.append_child(tr, td).unwrap();

        assert_eq!(header_direction(&mut tree, th), Some(HeaderDirection::Col));
        assert_eq!(tree.attr(th, "scope"), None);
        assert_eq!(table_of(&tree, th), Some(table));
    }
}
