//! Callback-data wire format of the inline keyboards.
//!
//! Tokens are colon-delimited ASCII prefixes followed by their arguments,
//! e.g. `SELECT_PARENT:Electronics`, `PAGE_PARENT:2` or
//! `DELETE_SUBCATEGORY:<child id>:<parent id>`. Names are only embedded
//! where the flow needs them; deletions carry numeric ids to stay short.

use std::fmt;

pub const ADD_CATEGORY: &str = "ADD_CATEGORY";
pub const ADD_SUBCATEGORY: &str = "ADD_SUBCATEGORY";
pub const PAGE_PARENT: &str = "PAGE_PARENT";
pub const SELECT_PARENT: &str = "SELECT_PARENT";
pub const PAGE_CATEGORY: &str = "PAGE_CATEGORY";
pub const SELECT_CATEGORY: &str = "SELECT_CATEGORY";
pub const DELETE_SUBCATEGORY: &str = "DELETE_SUBCATEGORY";
pub const DELETE_CATEGORY: &str = "DELETE_CATEGORY";

/// Telegram rejects buttons whose callback data exceeds this many bytes
pub const MAX_CALLBACK_DATA_LEN: usize = 64;

/// A decoded callback token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    AddCategory,
    AddSubcategory,
    /// 1-based page of the parent picker
    ParentPage(usize),
    SelectParent(String),
    /// 1-based page of the removal picker
    CategoryPage(usize),
    SelectCategory(i64),
    DeleteSubcategory { child_id: i64, parent_id: i64 },
    DeleteCategory(i64),
    /// Anything else, looked up in the command registry as-is
    Other(String),
}

impl CallbackAction {
    /// Decode callback data by prefix. Malformed arguments fall through to `Other`.
    pub fn parse(data: &str) -> Self {
        let (prefix, args) = match data.split_once(':') {
            Some((prefix, args)) => (prefix, Some(args)),
            None => (data, None),
        };

        let parsed = match (prefix, args) {
            (ADD_CATEGORY, None) => Some(Self::AddCategory),
            (ADD_SUBCATEGORY, None) => Some(Self::AddSubcategory),
            (PAGE_PARENT, Some(page)) => page.parse().ok().map(Self::ParentPage),
            // Names may themselves contain ':'
            (SELECT_PARENT, Some(name)) if !name.is_empty() => {
                Some(Self::SelectParent(name.to_string()))
            }
            (PAGE_CATEGORY, Some(page)) => page.parse().ok().map(Self::CategoryPage),
            (SELECT_CATEGORY, Some(id)) => id.parse().ok().map(Self::SelectCategory),
            (DELETE_SUBCATEGORY, Some(ids)) => ids.split_once(':').and_then(|(child, parent)| {
                Some(Self::DeleteSubcategory {
                    child_id: child.parse().ok()?,
                    parent_id: parent.parse().ok()?,
                })
            }),
            (DELETE_CATEGORY, Some(id)) => id.parse().ok().map(Self::DeleteCategory),
            _ => None,
        };

        parsed.unwrap_or_else(|| Self::Other(data.to_string()))
    }
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddCategory => f.write_str(ADD_CATEGORY),
            Self::AddSubcategory => f.write_str(ADD_SUBCATEGORY),
            Self::ParentPage(page) => write!(f, "{PAGE_PARENT}:{page}"),
            Self::SelectParent(name) => write!(f, "{SELECT_PARENT}:{name}"),
            Self::CategoryPage(page) => write!(f, "{PAGE_CATEGORY}:{page}"),
            Self::SelectCategory(id) => write!(f, "{SELECT_CATEGORY}:{id}"),
            Self::DeleteSubcategory {
                child_id,
                parent_id,
            } => write!(f, "{DELETE_SUBCATEGORY}:{child_id}:{parent_id}"),
            Self::DeleteCategory(id) => write!(f, "{DELETE_CATEGORY}:{id}"),
            Self::Other(token) => f.write_str(token),
        }
    }
}
