use category_bot::db::Category;
use category_bot::excel::{export_workbook, read_import_rows, template_workbook, ImportRow};
use category_bot::tree::build_forest;
use rust_xlsxwriter::Workbook;

fn cat(id: i64, name: &str, parent_id: Option<i64>) -> Category {
    Category {
        id,
        name: name.to_string(),
        parent_id,
    }
}

#[test]
fn test_import_rows_trim_and_stringify_cells() {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "Category").unwrap();
    sheet.write_string(0, 1, "Subcategory").unwrap();
    sheet.write_string(1, 0, "  Drinks ").unwrap();
    sheet.write_string(1, 1, "Cola\t").unwrap();
    sheet.write_number(2, 0, 2024.0).unwrap();
    sheet.write_string(2, 1, "Models").unwrap();
    sheet.write_string(3, 0, "Snacks").unwrap();
    let bytes = workbook.save_to_buffer().unwrap();

    let rows = read_import_rows(&bytes).unwrap();
    assert_eq!(
        rows,
        vec![
            ImportRow {
                row: 1,
                parent: "Drinks".into(),
                child: "Cola".into(),
            },
            ImportRow {
                row: 2,
                parent: "2024".into(),
                child: "Models".into(),
            },
            ImportRow {
                row: 3,
                parent: "Snacks".into(),
                child: String::new(),
            },
        ]
    );
}

#[test]
fn test_header_only_sheet_has_no_rows() {
    let bytes = template_header_only();
    assert!(read_import_rows(&bytes).unwrap().is_empty());
}

fn template_header_only() -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "Category").unwrap();
    workbook.save_to_buffer().unwrap()
}

#[test]
fn test_garbage_is_not_a_workbook() {
    assert!(read_import_rows(b"PK\x03\x04 truncated").is_err());
    assert!(read_import_rows(&[]).is_err());
}

#[test]
fn test_template_rows_are_importable() {
    let bytes = template_workbook("Categories", "Category", "Subcategory").unwrap();
    let rows = read_import_rows(&bytes).unwrap();

    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|row| row.parent == rows[0].parent));
    assert_ne!(rows[0].child, rows[1].child);
}

#[test]
fn test_export_lists_every_category_depth_first() {
    let forest = build_forest(&[
        cat(1, "Cars", None),
        cat(2, "Porsche", Some(1)),
        cat(3, "911", Some(2)),
        cat(4, "Boats", None),
    ]);
    let bytes = export_workbook(&forest, "Categories", "Name").unwrap();

    let cells: Vec<String> = read_import_rows(&bytes)
        .unwrap()
        .into_iter()
        .map(|row| row.parent)
        .collect();
    assert_eq!(cells, vec!["Boats", "Cars", "└─ Porsche", "└─ 911"]);
}
