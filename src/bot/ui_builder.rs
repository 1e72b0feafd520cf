//! UI Builder module for creating keyboards and formatting messages

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};
use tracing::warn;

use super::callback_data::{CallbackAction, MAX_CALLBACK_DATA_LEN};
use super::commands::Command;
use crate::db::Category;
use crate::errors::CategoryError;
use crate::localization::{t_args_lang, t_lang};

/// Buttons per page of the category pickers
pub const PAGE_SIZE: usize = 5;

/// The slice of a list visible on one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// 1-based page actually shown
    pub page: usize,
    pub start: usize,
    pub end: usize,
    pub total: usize,
    pub pages: usize,
}

impl PageWindow {
    pub fn has_prev(&self) -> bool {
        self.start > 0
    }

    pub fn has_next(&self) -> bool {
        self.end < self.total
    }
}

/// Compute the visible window of `total` items for a 1-based `page`.
///
/// Pages below 1 show the first page; pages past the end show the last one.
pub fn paginate(total: usize, page: usize, page_size: usize) -> PageWindow {
    let page_size = page_size.max(1);
    let pages = total.div_ceil(page_size).max(1);
    let page = page.clamp(1, pages);
    let start = (page - 1) * page_size;
    let end = (start + page_size).min(total);

    PageWindow {
        page,
        start,
        end,
        total,
        pages,
    }
}

/// Inline button carrying an encoded callback action
pub fn callback_button(text: impl Into<String>, action: &CallbackAction) -> InlineKeyboardButton {
    let data = action.to_string();
    if data.len() > MAX_CALLBACK_DATA_LEN {
        warn!(
            data_len = data.len(),
            max = MAX_CALLBACK_DATA_LEN,
            "Callback data exceeds the Telegram limit"
        );
    }
    InlineKeyboardButton::callback(text, data)
}

/// Persistent reply keyboard with the main menu
pub fn main_menu_keyboard(language_code: Option<&str>) -> KeyboardMarkup {
    let label = |key: &str| KeyboardButton::new(t_lang(key, language_code));
    KeyboardMarkup::new(vec![
        vec![label("menu-help"), label("menu-add")],
        vec![label("menu-tree"), label("menu-remove")],
        vec![label("menu-view"), label("menu-import")],
        vec![label("menu-download")],
    ])
    .resize_keyboard()
}

/// Quick actions under the help text; their data are registry tokens
pub fn help_quick_actions_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    let button = |key: &str, command: Command| {
        let token = command.inline_token().unwrap_or_else(|| command.slash());
        InlineKeyboardButton::callback(t_lang(key, language_code), token)
    };
    InlineKeyboardMarkup::new(vec![
        vec![
            button("quick-tree", Command::ViewTree),
            button("quick-view", Command::ViewCategories),
        ],
        vec![
            button("quick-download", Command::Download),
            button("quick-upload", Command::Upload),
        ],
        vec![
            button("quick-add", Command::AddElement),
            button("quick-remove", Command::RemoveElement),
        ],
    ])
}

/// Choice between adding a root category and a subcategory
pub fn add_menu_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![callback_button(
            t_lang("add-root-button", language_code),
            &CallbackAction::AddCategory,
        )],
        vec![callback_button(
            t_lang("add-child-button", language_code),
            &CallbackAction::AddSubcategory,
        )],
    ])
}

/// One button per item of the window plus a navigation row
fn paged_keyboard(
    items: &[Category],
    window: PageWindow,
    select: impl Fn(&Category) -> CallbackAction,
    page: impl Fn(usize) -> CallbackAction,
    language_code: Option<&str>,
) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = items[window.start..window.end]
        .iter()
        .map(|category| vec![callback_button(category.name.clone(), &select(category))])
        .collect();

    let mut navigation = Vec::new();
    if window.has_prev() {
        navigation.push(callback_button(
            t_lang("page-prev", language_code),
            &page(window.page - 1),
        ));
    }
    if window.has_next() {
        navigation.push(callback_button(
            t_lang("page-next", language_code),
            &page(window.page + 1),
        ));
    }
    if !navigation.is_empty() {
        rows.push(navigation);
    }

    InlineKeyboardMarkup::new(rows)
}

fn picker_title(key: &str, window: PageWindow, language_code: Option<&str>) -> String {
    t_args_lang(
        key,
        &[
            ("page", &window.page.to_string()),
            ("pages", &window.pages.to_string()),
            ("from", &(window.start + 1).to_string()),
            ("to", &window.end.to_string()),
            ("total", &window.total.to_string()),
        ],
        language_code,
    )
}

/// Page of the parent picker of the add flow; `roots` must not be empty
pub fn parent_picker(
    roots: &[Category],
    page: usize,
    language_code: Option<&str>,
) -> (String, InlineKeyboardMarkup) {
    let window = paginate(roots.len(), page, PAGE_SIZE);
    let keyboard = paged_keyboard(
        roots,
        window,
        |category| CallbackAction::SelectParent(category.name.clone()),
        CallbackAction::ParentPage,
        language_code,
    );
    (picker_title("select-parent-title", window, language_code), keyboard)
}

/// Page of the root picker of the removal flow; `roots` must not be empty
pub fn category_picker(
    roots: &[Category],
    page: usize,
    language_code: Option<&str>,
) -> (String, InlineKeyboardMarkup) {
    let window = paginate(roots.len(), page, PAGE_SIZE);
    let keyboard = paged_keyboard(
        roots,
        window,
        |category| CallbackAction::SelectCategory(category.id),
        CallbackAction::CategoryPage,
        language_code,
    );
    (picker_title("select-category-title", window, language_code), keyboard)
}

/// Direct children of `parent` as delete buttons, plus one to delete the parent itself
pub fn subcategory_picker(
    parent: &Category,
    children: &[Category],
    language_code: Option<&str>,
) -> (String, InlineKeyboardMarkup) {
    let mut text = t_args_lang(
        "remove-subcategory-title",
        &[("name", &parent.name)],
        language_code,
    );
    if children.is_empty() {
        text.push_str("\n\n");
        text.push_str(&t_args_lang(
            "remove-no-subcategories",
            &[("name", &parent.name)],
            language_code,
        ));
    }

    let mut rows: Vec<Vec<InlineKeyboardButton>> = children
        .iter()
        .map(|child| {
            vec![callback_button(
                child.name.clone(),
                &CallbackAction::DeleteSubcategory {
                    child_id: child.id,
                    parent_id: parent.id,
                },
            )]
        })
        .collect();
    rows.push(vec![callback_button(
        t_lang("remove-category-button", language_code),
        &CallbackAction::DeleteCategory(parent.id),
    )]);

    (text, InlineKeyboardMarkup::new(rows))
}

/// User-facing text for a category error
pub fn category_error_text(err: &CategoryError, language_code: Option<&str>) -> String {
    let (key, args) = err.message_key();
    let args: Vec<(&str, &str)> = args.iter().map(|(name, value)| (*name, value.as_str())).collect();
    t_args_lang(key, &args, language_code)
}

/// Heading followed by one `• item` line per entry
pub fn bullet_list(heading: &str, items: &[String]) -> String {
    let mut text = String::from(heading);
    for item in items {
        text.push_str("\n• ");
        text.push_str(item);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::InlineKeyboardButtonKind;

    fn roots(count: i64) -> Vec<Category> {
        (1..=count)
            .map(|id| Category {
                id,
                name: format!("Root {id}"),
                parent_id: None,
            })
            .collect()
    }

    fn data(button: &InlineKeyboardButton) -> &str {
        match &button.kind {
            InlineKeyboardButtonKind::CallbackData(data) => data,
            other => panic!("unexpected button kind {other:?}"),
        }
    }

    #[test]
    fn test_paginate_windows() {
        let first = paginate(12, 1, 5);
        assert_eq!((first.start, first.end, first.pages), (0, 5, 3));
        assert!(!first.has_prev());
        assert!(first.has_next());

        let last = paginate(12, 3, 5);
        assert_eq!((last.start, last.end), (10, 12));
        assert!(last.has_prev());
        assert!(!last.has_next());

        let exact = paginate(10, 2, 5);
        assert_eq!((exact.start, exact.end), (5, 10));
        assert!(!exact.has_next());
    }

    #[test]
    fn test_paginate_clamps_out_of_range_pages() {
        assert_eq!(paginate(7, 0, 5).page, 1);
        let past_end = paginate(7, 9, 5);
        assert_eq!(past_end.page, 2);
        assert_eq!((past_end.start, past_end.end), (5, 7));

        let empty = paginate(0, 1, 5);
        assert_eq!((empty.start, empty.end, empty.pages), (0, 0, 1));
    }

    #[test]
    fn test_paginate_property() {
        for total in 0..23usize {
            let pages = total.div_ceil(5).max(1);
            for page in 1..=pages {
                let w = paginate(total, page, 5);
                assert_eq!(w.start, 5 * (page - 1));
                assert_eq!(w.end, (5 * page).min(total));
                assert_eq!(w.has_prev(), page > 1);
                assert_eq!(w.has_next(), 5 * page < total);
            }
        }
    }

    #[test]
    fn test_parent_picker_buttons() {
        let (_, keyboard) = parent_picker(&roots(7), 2, Some("en"));
        let rows = &keyboard.inline_keyboard;
        assert_eq!(rows.len(), 3);
        assert_eq!(data(&rows[0][0]), "SELECT_PARENT:Root 6");
        assert_eq!(data(&rows[1][0]), "SELECT_PARENT:Root 7");
        assert_eq!(rows[2].len(), 1);
        assert_eq!(data(&rows[2][0]), "PAGE_PARENT:1");
    }

    #[test]
    fn test_category_picker_uses_ids() {
        let (title, keyboard) = category_picker(&roots(6), 1, Some("en"));
        assert!(title.contains("1-5"), "{title}");
        assert!(title.contains('6'), "{title}");
        let rows = &keyboard.inline_keyboard;
        assert_eq!(data(&rows[0][0]), "SELECT_CATEGORY:1");
        assert_eq!(data(rows.last().unwrap().last().unwrap()), "PAGE_CATEGORY:2");
    }

    #[test]
    fn test_subcategory_picker() {
        let parent = Category {
            id: 1,
            name: "Cars".into(),
            parent_id: None,
        };
        let children = vec![Category {
            id: 4,
            name: "Porsche".into(),
            parent_id: Some(1),
        }];
        let (text, keyboard) = subcategory_picker(&parent, &children, Some("en"));
        assert!(text.contains("Cars"));
        let rows = &keyboard.inline_keyboard;
        assert_eq!(data(&rows[0][0]), "DELETE_SUBCATEGORY:4:1");
        assert_eq!(data(&rows[1][0]), "DELETE_CATEGORY:1");
    }

    #[test]
    fn test_help_quick_actions_are_registry_tokens() {
        let keyboard = help_quick_actions_keyboard(None);
        let tokens: Vec<&str> = keyboard.inline_keyboard.iter().flatten().map(data).collect();
        assert_eq!(
            tokens,
            vec!["VIEW_TREE", "VIEW_CATEGORIES", "DOWNLOAD", "UPLOAD", "ADD_ELEMENT", "REMOVE_ELEMENT"]
        );
    }

    #[test]
    fn test_category_error_text() {
        let text = category_error_text(&CategoryError::DuplicateName("Drinks".into()), Some("en"));
        assert!(text.contains("\"Drinks\""), "{text}");
        let text = category_error_text(&CategoryError::NameTooLong { max: 255 }, Some("ru"));
        assert!(text.contains("255"), "{text}");
    }

    #[test]
    fn test_bullet_list() {
        assert_eq!(
            bullet_list("Added:", &["a".into(), "b".into()]),
            "Added:\n• a\n• b"
        );
    }
}
