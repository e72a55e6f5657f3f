//! Deal table loading.
//!
//! Each row names the target company, the deal number and the announcement
//! date. The search window covers the three years (3 × 365 days) before the
//! announcement.

use std::io::Read;
use std::path::Path;

use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::pipeline::CompanyTask;

pub const WINDOW_DAYS: u64 = 3 * 365;

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("cannot read deal table: {0}")]
    Csv(#[from] csv::Error),

    #[error("record {record}: invalid anndate '{value}' (expected YYYY-MM-DD)")]
    Date { record: usize, value: String },

    #[error("{0} is a spreadsheet; save it as CSV and pass that file instead")]
    Spreadsheet(String),
}

const SPREADSHEET_EXTENSIONS: [&str; 4] = ["xls", "xlsx", "xlsm", "ods"];

#[derive(Debug, Deserialize)]
struct DealRow {
    comnam_tar: String,
    deal_number: String,
    #[serde(default)]
    anndate: String,
}

pub fn read_tasks(path: &Path) -> Result<Vec<CompanyTask>, InputError> {
    if let Some(ext) = path.extension().and_then(|e| e.to_str())
        && SPREADSHEET_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
    {
        return Err(InputError::Spreadsheet(path.display().to_string()));
    }
    tasks_from_reader(std::fs::File::open(path).map_err(csv::Error::from)?)
}

pub fn tasks_from_reader<R: Read>(input: R) -> Result<Vec<CompanyTask>, InputError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);
    let mut tasks = Vec::new();
    for (index, row) in reader.deserialize::<DealRow>().enumerate() {
        let row = row?;
        let announced = parse_anndate(&row.anndate).ok_or_else(|| InputError::Date {
            record: index + 1,
            value: row.anndate.clone(),
        })?;
        tasks.push(CompanyTask {
            company_name: row.comnam_tar,
            window_start: announced.and_then(|d| d.checked_sub_days(Days::new(WINDOW_DAYS))),
            window_end: announced,
            deal_id: row.deal_number,
        });
    }
    Ok(tasks)
}

/// `None` means unparseable; `Some(None)` is a blank date.
fn parse_anndate(raw: &str) -> Option<Option<NaiveDate>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(None);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date()))
        .ok()
        .map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn derives_three_year_window() {
        let csv = "comnam_tar,anndate,deal_number\nacme inc,2021-01-01,9001\n";
        let tasks = tasks_from_reader(csv.as_bytes()).unwrap();

        assert_eq!(
            tasks,
            vec![CompanyTask {
                company_name: "acme inc".into(),
                // 1095 days, so one day short of three calendar years across a leap year.
                window_start: date(2018, 1, 2),
                window_end: date(2021, 1, 1),
                deal_id: "9001".into(),
            }]
        );
    }

    #[test]
    fn accepts_timestamps_and_extra_columns() {
        let csv = "deal_number,comnam_tar,anndate,sic\n7, Widget Co ,2015-06-30 00:00:00,3571\n";
        let tasks = tasks_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(tasks[0].company_name, "Widget Co");
        assert_eq!(tasks[0].window_end, date(2015, 6, 30));
        assert_eq!(tasks[0].window_start, date(2012, 6, 30));
    }

    #[test]
    fn blank_date_means_no_window() {
        let csv = "comnam_tar,anndate,deal_number\nacme,,1\n";
        let tasks = tasks_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(tasks[0].window_start, None);
        assert_eq!(tasks[0].window_end, None);
    }

    #[test]
    fn malformed_date_names_the_record() {
        let csv = "comnam_tar,anndate,deal_number\nacme,2020-01-01,1\nwidget,06/30/2015,2\n";
        let err = tasks_from_reader(csv.as_bytes()).unwrap_err();
        assert!(
            matches!(&err, InputError::Date { record: 2, value } if value == "06/30/2015"),
            "got: {err:?}"
        );
    }

    #[test]
    fn missing_column_is_an_error() {
        let csv = "comnam_tar,anndate\nacme,2020-01-01\n";
        assert!(matches!(
            tasks_from_reader(csv.as_bytes()),
            Err(InputError::Csv(_))
        ));
    }

    #[test]
    fn spreadsheet_input_asks_for_csv() {
        let result = read_tasks(Path::new("/data/SDC.XLS"));
        assert!(
            matches!(&result, Err(InputError::Spreadsheet(path)) if path == "/data/SDC.XLS"),
            "got: {result:?}"
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = read_tasks(Path::new("/nonexistent/deals.csv"));
        assert!(matches!(result, Err(InputError::Csv(_))));
    }
}
