// 📂 Record Loader - SSA yearly name files → FilterEngine
//
// Source format (one file per year, no header):
//   yob2014.txt
//     Emma,F,20799
//     Olivia,F,19674
//     ...
//     Noah,M,19144

use crate::engine::FilterEngine;
use crate::entities::Sex;
use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use serde::Serialize;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One line of a yearly file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRecord {
    pub name: String,
    pub sex: Sex,
    pub year: i32,
    pub count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub files: usize,
    pub records: usize,
    pub names: usize,
}

/// Extract the year from a file named `yobYYYY.txt`
pub fn year_from_file_name(file_name: &str) -> Option<i32> {
    file_name
        .strip_prefix("yob")?
        .strip_suffix(".txt")
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))?
        .parse()
        .ok()
}

/// Parse the content of one yearly file
pub fn read_year_records<R: Read>(reader: R, year: i32, source: &str) -> Result<Vec<NameRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .trim(Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();

    for (line_num, result) in reader.records().enumerate() {
        let line = line_num + 1;
        let record = result
            .with_context(|| format!("Failed to parse CSV line {} in {}", line, source))?;

        // Name,Sex,Count
        let name = record.get(0).unwrap_or("").to_string();
        let sex: Sex = record
            .get(1)
            .unwrap_or("")
            .parse()
            .with_context(|| format!("Bad sex code on line {} in {}", line, source))?;
        let count: i64 = record
            .get(2)
            .unwrap_or("")
            .parse()
            .with_context(|| format!("Bad count on line {} in {}", line, source))?;

        records.push(NameRecord { name, sex, year, count });
    }

    Ok(records)
}

/// Yearly files in `dir`, sorted by year
fn year_files(dir: &Path) -> Result<Vec<(i32, PathBuf)>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)
        .with_context(|| format!("Failed to read data directory: {}", dir.display()))?
    {
        let path = entry?.path();
        let year = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(year_from_file_name);

        if let Some(year) = year {
            files.push((year, path));
        }
    }

    files.sort();
    Ok(files)
}

/// Load every yearly file in range and finalize the result into `engine`.
///
/// The files are read into a fresh catalog that replaces `engine`'s only
/// once every file loaded. Selections and `NameId`s from the previous
/// catalog are dropped; config, query parameters and the active user stay.
/// On error `engine` is left exactly as it was.
pub fn load_directory(dir: &Path, engine: &mut FilterEngine) -> Result<LoadSummary> {
    let mut summary = LoadSummary::default();
    let mut scratch = engine.successor();

    for (year, path) in year_files(dir)? {
        if !scratch.config().contains_year(year) {
            debug!(year, path = %path.display(), "skipping file outside catalog range");
            continue;
        }

        let file = File::open(&path)
            .with_context(|| format!("Failed to open file: {}", path.display()))?;
        let source = path.display().to_string();
        let records = read_year_records(file, year, &source)?;

        for record in &records {
            scratch
                .add_record(&record.name, record.sex, record.year, record.count)
                .with_context(|| format!("Rejected record {:?} from {}", record, source))?;
        }

        debug!(year, records = records.len(), "loaded yearly file");
        summary.files += 1;
        summary.records += records.len();
    }

    if summary.files == 0 {
        warn!(dir = %dir.display(), "no yearly name files in catalog range");
    }

    scratch.finalize();
    summary.names = scratch.len();

    *engine = scratch;

    info!(
        files = summary.files,
        records = summary.records,
        names = summary.names,
        "name files loaded"
    );

    Ok(summary)
}
