//! # Tree Module
//!
//! Builds the category forest from flat store rows and renders it as an
//! indented text tree. Children are found through their `parent_id`; every
//! level is ordered by name, case-insensitively.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::db::Category;

/// Indentation unit of the text tree, repeated once per level
pub const INDENT_UNIT: &str = "    ";
pub const FIRST_LEVEL_MARKER: &str = "🔹 ";
pub const DEEP_LEVEL_MARKER: &str = "◦ ";

/// A category together with its (sorted) descendants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub category: Category,
    pub children: Vec<TreeNode>,
}

/// Case-insensitive name order with an exact-name tie break
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Sort categories the way every level of the tree is ordered
pub fn sort_by_name(categories: &mut [Category]) {
    categories.sort_by(|a, b| compare_names(&a.name, &b.name));
}

/// Build the forest of root categories from a flat list of rows.
///
/// Rows whose parent is missing from `categories` are not reachable and are
/// left out. Each id is placed at most once, so a corrupt parent cycle
/// cannot recurse forever.
pub fn build_forest(categories: &[Category]) -> Vec<TreeNode> {
    let mut by_parent: HashMap<Option<i64>, Vec<&Category>> = HashMap::new();
    for category in categories {
        by_parent.entry(category.parent_id).or_default().push(category);
    }

    let mut visited = HashSet::new();
    build_level(None, &by_parent, &mut visited)
}

fn build_level(
    parent_id: Option<i64>,
    by_parent: &HashMap<Option<i64>, Vec<&Category>>,
    visited: &mut HashSet<i64>,
) -> Vec<TreeNode> {
    let mut level: Vec<Category> = by_parent
        .get(&parent_id)
        .map(|rows| rows.iter().map(|c| (*c).clone()).collect())
        .unwrap_or_default();
    sort_by_name(&mut level);

    let mut nodes = Vec::with_capacity(level.len());
    for category in level {
        if visited.insert(category.id) {
            let children = build_level(Some(category.id), by_parent, visited);
            nodes.push(TreeNode { category, children });
        }
    }
    nodes
}

/// Visit every node depth-first in display order, with its depth (roots are 0)
pub fn walk<'a>(forest: &'a [TreeNode], visit: &mut impl FnMut(usize, &'a Category)) {
    fn go<'a>(nodes: &'a [TreeNode], level: usize, visit: &mut impl FnMut(usize, &'a Category)) {
        for node in nodes {
            visit(level, &node.category);
            go(&node.children, level + 1, visit);
        }
    }
    go(forest, 0, visit);
}

/// Render the forest under a header line.
///
/// The header is level 0; root categories are level 1 and get
/// [`FIRST_LEVEL_MARKER`], anything deeper gets [`DEEP_LEVEL_MARKER`].
pub fn format_tree(header: &str, forest: &[TreeNode]) -> String {
    let mut out = String::new();
    out.push(' ');
    out.push_str(header);
    out.push('\n');

    walk(forest, &mut |depth, category| {
        let level = depth + 1;
        out.push_str(&INDENT_UNIT.repeat(level));
        out.push_str(if level == 1 {
            FIRST_LEVEL_MARKER
        } else {
            DEEP_LEVEL_MARKER
        });
        out.push_str(&category.name);
        out.push('\n');
    });

    out
}
