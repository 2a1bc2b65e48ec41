use crate::ingest::lowercase_extension;
use crate::ingest::table::Table;
use crate::prelude::{Position, WddError, WddResult};
use crate::records::ManualAnnotation;
use log::info;
use std::path::Path;

pub const VIDEO_NAME: &str = "video_name";
pub const WAGGLE_INDEX: &str = "waggle_index";
pub const WAGGLE_START_FRAMES: &str = "waggle_start_frames";
pub const WAGGLE_START_X: &str = "waggle_start_positions_x";
pub const WAGGLE_START_Y: &str = "waggle_start_positions_y";
pub const THORAX_X: &str = "thorax_positions_x";
pub const THORAX_Y: &str = "thorax_positions_y";
pub const DANCE_ANGLE: &str = "Positiver Tanzwinkel in Grad";

const ACCEPTED_EXTENSIONS: [&str; 3] = ["xls", "xlsx", "csv"];

/// Checks that the annotation path names an existing spreadsheet or CSV file.
pub fn validate_annotation_path(path: &Path) -> WddResult<()> {
    let invalid =
        |message: &str| WddError::InvalidConfig(format!("{}: {}", message, path.display()));
    if !path.exists() {
        return Err(invalid("file does not exist"));
    }
    if !path.is_file() {
        return Err(invalid("not a file"));
    }
    match lowercase_extension(path) {
        Some(ext) if ACCEPTED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(invalid("not an Excel or CSV file")),
    }
}

/// Reads every annotated waggle run from the sheet, in sheet order.
pub fn load_annotations(path: &Path, header_row: usize) -> WddResult<Vec<ManualAnnotation>> {
    let table = Table::load(path, header_row)?;
    let annotations = annotations_from_table(&table)?;
    info!(
        "loaded {} manual annotations from {}",
        annotations.len(),
        path.display()
    );
    Ok(annotations)
}

pub fn annotations_from_table(table: &Table) -> WddResult<Vec<ManualAnnotation>> {
    let video = table.column(VIDEO_NAME)?;
    let index = table.column(WAGGLE_INDEX)?;
    let start_frames = table.column(WAGGLE_START_FRAMES)?;
    let start_x = table.column(WAGGLE_START_X)?;
    let start_y = table.column(WAGGLE_START_Y)?;
    let thorax = table.find_column(THORAX_X).zip(table.find_column(THORAX_Y));
    let angle = table.find_column(DANCE_ANGLE);

    table
        .rows()
        .map(|row| {
            let waggle_index = row.require_number(index)?;
            if waggle_index.fract() != 0.0 {
                return Err(row.error(index, "waggle index must be an integer"));
            }
            let thorax = match thorax {
                Some((x, y)) => row
                    .number(x)?
                    .zip(row.number(y)?)
                    .map(|(x, y)| Position::new(x, y)),
                None => None,
            };
            let waggle_angle_deg = match angle {
                Some(column) => row.number(column)?,
                None => None,
            };

            Ok(ManualAnnotation {
                row: row.line(),
                video_name: row.require_text(video)?.to_string(),
                waggle_index: waggle_index as i64,
                waggle_start_frame: row.require_number(start_frames)?,
                waggle_start: Position::new(
                    row.require_number(start_x)?,
                    row.require_number(start_y)?,
                ),
                thorax,
                waggle_angle_deg,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{Builder, TempDir};

    const SHEET: &str = "Tunnel dances,,,,,,,,\n\
video_name,waggle_index,waggle_start_frames,waggle_start_positions_x,waggle_start_positions_y,thorax_positions_x,thorax_positions_y, Positiver Tanzwinkel in Grad  \n\
./cam-1_20240904T120000Z--20240904T120500Z_1_2.mp4,0,30,100,200,110,210,45.5\n\
./cam-1_20240904T120000Z--20240904T120500Z_1_2.mp4,1.0,60,101,201,,,\n";

    #[test]
    fn loads_annotation_rows_with_optional_columns() {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(SHEET.as_bytes()).unwrap();

        let annotations = load_annotations(file.path(), 1).unwrap();
        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations[0].row, 3);
        assert_eq!(annotations[0].waggle_start, Position::new(100.0, 200.0));
        assert_eq!(annotations[0].thorax, Some(Position::new(110.0, 210.0)));
        assert_eq!(annotations[0].waggle_angle_deg, Some(45.5));
        assert_eq!(annotations[1].waggle_index, 1);
        assert_eq!(annotations[1].thorax, None);
        assert_eq!(annotations[1].waggle_angle_deg, None);
    }

    #[test]
    fn missing_required_cell_names_the_row() {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(b"video_name,waggle_index,waggle_start_frames,waggle_start_positions_x,waggle_start_positions_y\nv.mp4,0,,1,2\n")
            .unwrap();
        let err = load_annotations(file.path(), 0).unwrap_err();
        assert!(err.to_string().contains("row 2"));
        assert!(err.to_string().contains("waggle_start_frames"));
    }

    #[test]
    fn validation_rejects_directories_and_other_formats() {
        let dir = TempDir::new().unwrap();
        assert!(validate_annotation_path(dir.path()).is_err());
        assert!(validate_annotation_path(&dir.path().join("absent.xlsx")).is_err());

        let text = Builder::new().suffix(".txt").tempfile().unwrap();
        assert!(validate_annotation_path(text.path()).is_err());

        let sheet = Builder::new().suffix(".XLSX").tempfile().unwrap();
        assert!(validate_annotation_path(sheet.path()).is_ok());
    }
}
