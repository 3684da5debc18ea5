use crate::consolidate::error::ConsolidateError;
use crate::consolidate::flatten::{load_year, FlatRecord};
use crate::consolidate::frame::{localize_and_sort, rows_to_dataframe};
use crate::fetch::DEFAULT_SUB_KEY;
use crate::progress::Reporter;
use log::{info, warn};
use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Classifies a directory base name as year-like. Pure so the year
/// detection is testable without a filesystem.
pub(crate) fn parse_year(name: &str) -> Option<i32> {
    name.parse::<i32>().ok().filter(|y| *y >= 0)
}

/// Merges all cached years of each location into one sorted, timezone-aware
/// dataset and emits it as CSV plus a Parquet binary table.
#[derive(Debug, Clone)]
pub struct Consolidator {
    input_root: PathBuf,
    output_root: PathBuf,
    sub_key: String,
}

impl Consolidator {
    pub fn new(input_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            input_root: input_root.into(),
            output_root: output_root.into(),
            sub_key: DEFAULT_SUB_KEY.to_string(),
        }
    }

    pub fn with_sub_key(mut self, sub_key: impl Into<String>) -> Self {
        self.sub_key = sub_key.into();
        self
    }

    /// Location directories under the input root, sorted by name.
    pub fn locations(&self) -> Result<Vec<String>, ConsolidateError> {
        let entries = fs::read_dir(&self.input_root)
            .map_err(|e| ConsolidateError::DirList(self.input_root.clone(), e))?;
        let mut locations = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| ConsolidateError::DirList(self.input_root.clone(), e))?;
            if entry.path().is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    locations.push(name.to_string());
                }
            }
        }
        locations.sort();
        Ok(locations)
    }

    /// Year subdirectories of one location, ascending. Non-year-like names
    /// (stray files, scratch directories) are skipped.
    fn year_directories(
        &self,
        location_dir: &Path,
    ) -> Result<Vec<(i32, PathBuf)>, ConsolidateError> {
        let entries = fs::read_dir(location_dir)
            .map_err(|e| ConsolidateError::DirList(location_dir.to_path_buf(), e))?;
        let mut years = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| ConsolidateError::DirList(location_dir.to_path_buf(), e))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            match entry.file_name().to_str().and_then(parse_year) {
                Some(year) => years.push((year, path)),
                None => warn!("ignoring non-year directory '{}'", path.display()),
            }
        }
        years.sort();
        Ok(years)
    }

    /// Builds the consolidated dataset for one location: all years' rows
    /// merged, timestamp columns localized to the location's timezone, sorted
    /// ascending by `time`. Returns the dataset and the timezone used.
    pub fn build(
        &self,
        location: &str,
        reporter: &dyn Reporter,
    ) -> Result<(DataFrame, String), ConsolidateError> {
        let location_dir = self.input_root.join(location);
        let years = self.year_directories(&location_dir)?;
        reporter.begin(years.len() as u64);

        let mut rows: Vec<FlatRecord> = Vec::new();
        let mut timezone: Option<String> = None;
        for (year, year_dir) in years {
            let observations = load_year(&year_dir, &self.sub_key)?;
            info!(
                "{}/{}: {} observation rows",
                location,
                year,
                observations.rows.len()
            );
            rows.extend(observations.rows);
            if observations.timezone.is_some() {
                timezone = observations.timezone;
            }
            reporter.advance(1);
        }

        if rows.is_empty() {
            return Err(ConsolidateError::NoObservations(location_dir));
        }
        let timezone = timezone.ok_or(ConsolidateError::MissingTimezone(location_dir))?;

        let df = rows_to_dataframe(&rows)?;
        let df = localize_and_sort(df, &timezone, location)?;
        Ok((df, timezone))
    }

    /// Emits both artifacts for a location. Each file is staged to a temp
    /// file and atomically published, so consumers never see a partial
    /// output; publishing happens only after the full merge+sort succeeded.
    pub fn write(
        &self,
        df: &mut DataFrame,
        location: &str,
    ) -> Result<(PathBuf, PathBuf), ConsolidateError> {
        fs::create_dir_all(&self.output_root)
            .map_err(|e| ConsolidateError::OutputDirCreation(self.output_root.clone(), e))?;

        let csv_path = self.output_root.join(format!("{location}_daily.csv"));
        let mut staged = NamedTempFile::new_in(&self.output_root)
            .map_err(|e| ConsolidateError::OutputIo(csv_path.clone(), e))?;
        CsvWriter::new(&mut staged)
            .include_header(true)
            .finish(df)
            .map_err(|e| ConsolidateError::OutputEncode(csv_path.clone(), e))?;
        staged
            .persist(&csv_path)
            .map_err(|e| ConsolidateError::OutputIo(csv_path.clone(), e.error))?;

        let parquet_path = self.output_root.join(format!("{location}_daily.parquet"));
        let mut staged = NamedTempFile::new_in(&self.output_root)
            .map_err(|e| ConsolidateError::OutputIo(parquet_path.clone(), e))?;
        ParquetWriter::new(staged.as_file_mut())
            .with_compression(ParquetCompression::Snappy)
            .finish(df)
            .map_err(|e| ConsolidateError::OutputEncode(parquet_path.clone(), e))?;
        staged
            .persist(&parquet_path)
            .map_err(|e| ConsolidateError::OutputIo(parquet_path.clone(), e.error))?;

        info!(
            "wrote {} and {}",
            csv_path.display(),
            parquet_path.display()
        );
        Ok((csv_path, parquet_path))
    }

    /// Consolidates every location under the input root, in sorted order.
    /// Any location's fatal parse aborts the whole pass.
    pub fn run(&self, reporter: &dyn Reporter) -> Result<(), ConsolidateError> {
        for location in self.locations()? {
            info!("consolidating '{}'", location);
            let (mut df, timezone) = self.build(&location, reporter)?;
            info!(
                "'{}': {} rows, timezone {}",
                location,
                df.height(),
                timezone
            );
            self.write(&mut df, &location)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoopReporter;
    use serde_json::json;
    use tempfile::tempdir;

    fn write_payload(root: &Path, location: &str, year: i32, doy: u32, times: &[i64]) {
        let dir = root.join(location).join(year.to_string());
        fs::create_dir_all(&dir).unwrap();
        let data: Vec<_> = times
            .iter()
            .map(|t| {
                json!({
                    "time": t,
                    "temperatureMax": 10.0 + doy as f64,
                    "sunriseTime": t + 25_000
                })
            })
            .collect();
        let payload = json!({
            "timezone": "America/New_York",
            "daily": { "data": data }
        });
        fs::write(
            dir.join(format!("{doy}.json")),
            serde_json::to_vec(&payload).unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn year_like_names_parse_and_others_do_not() {
        assert_eq!(parse_year("2014"), Some(2014));
        assert_eq!(parse_year("1999"), Some(1999));
        assert_eq!(parse_year("y2014"), None);
        assert_eq!(parse_year("scratch"), None);
        assert_eq!(parse_year("-5"), None);
        assert_eq!(parse_year(""), None);
    }

    #[test]
    fn years_are_discovered_sorted_and_filtered() {
        let dir = tempdir().unwrap();
        let loc = dir.path().join("lisbon");
        for name in ["2016", "2014", "notes", "2015"] {
            fs::create_dir_all(loc.join(name)).unwrap();
        }
        fs::write(loc.join("stray.json"), "{}").unwrap();

        let consolidator = Consolidator::new(dir.path(), dir.path());
        let years: Vec<i32> = consolidator
            .year_directories(&loc)
            .unwrap()
            .into_iter()
            .map(|(y, _)| y)
            .collect();
        assert_eq!(years, vec![2014, 2015, 2016]);
    }

    #[test]
    fn build_merges_years_sorted_with_conserved_row_count() {
        let raw = tempdir().unwrap();
        // Two years, three files, four rows total; written out of time order.
        write_payload(raw.path(), "nyc", 2020, 1, &[1_577_836_800]);
        write_payload(raw.path(), "nyc", 2019, 40, &[1_549_500_000, 1_549_586_400]);
        write_payload(raw.path(), "nyc", 2019, 1, &[1_546_300_800]);

        let out = tempdir().unwrap();
        let consolidator = Consolidator::new(raw.path(), out.path());
        let (df, timezone) = consolidator.build("nyc", &NoopReporter).unwrap();

        assert_eq!(timezone, "America/New_York");
        assert_eq!(df.height(), 4, "row count equals sum of data entries");

        let times = df.column("time").unwrap().datetime().unwrap();
        let physical: Vec<i64> = (0..df.height()).filter_map(|i| times.get(i)).collect();
        let mut sorted = physical.clone();
        sorted.sort_unstable();
        assert_eq!(physical, sorted, "index must be non-decreasing");
        assert_eq!(physical[0], 1_546_300_800_000);
    }

    #[test]
    fn duplicate_timestamps_from_overlapping_years_are_kept() {
        let raw = tempdir().unwrap();
        write_payload(raw.path(), "nyc", 2019, 1, &[1_546_300_800]);
        write_payload(raw.path(), "nyc", 2020, 1, &[1_546_300_800]);

        let out = tempdir().unwrap();
        let consolidator = Consolidator::new(raw.path(), out.path());
        let (df, _) = consolidator.build("nyc", &NoopReporter).unwrap();
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn malformed_year_aborts_the_location() {
        let raw = tempdir().unwrap();
        write_payload(raw.path(), "nyc", 2019, 1, &[1_546_300_800]);
        let bad_dir = raw.path().join("nyc/2020");
        fs::create_dir_all(&bad_dir).unwrap();
        fs::write(bad_dir.join("1.json"), br#"{"timezone": "UTC"}"#).unwrap();

        let out = tempdir().unwrap();
        let consolidator = Consolidator::new(raw.path(), out.path());
        let err = consolidator.build("nyc", &NoopReporter).unwrap_err();
        assert!(matches!(err, ConsolidateError::MalformedPayload { .. }));
    }

    #[test]
    fn empty_location_is_an_error() {
        let raw = tempdir().unwrap();
        fs::create_dir_all(raw.path().join("ghost")).unwrap();
        let out = tempdir().unwrap();
        let consolidator = Consolidator::new(raw.path(), out.path());
        let err = consolidator.build("ghost", &NoopReporter).unwrap_err();
        assert!(matches!(err, ConsolidateError::NoObservations(_)));
    }

    #[test]
    fn outputs_reload_consistently_in_both_formats() {
        let raw = tempdir().unwrap();
        write_payload(raw.path(), "nyc", 2019, 1, &[1_546_300_800]);
        write_payload(raw.path(), "nyc", 2019, 2, &[1_546_387_200]);

        let out = tempdir().unwrap();
        let consolidator = Consolidator::new(raw.path(), out.path());
        let (mut df, _) = consolidator.build("nyc", &NoopReporter).unwrap();
        let (csv_path, parquet_path) = consolidator.write(&mut df, "nyc").unwrap();

        // Parquet preserves row count, columns and tz-aware timestamps.
        let reloaded = LazyFrame::scan_parquet(&parquet_path, Default::default())
            .unwrap()
            .collect()
            .unwrap();
        assert_eq!(reloaded.shape(), df.shape());
        assert_eq!(reloaded.get_column_names(), df.get_column_names());
        assert_eq!(
            reloaded.column("time").unwrap().dtype(),
            &DataType::Datetime(TimeUnit::Milliseconds, Some("America/New_York".into()))
        );

        // CSV stringifies but keeps every row, with `time` leading.
        let csv = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(csv_path))
            .unwrap()
            .finish()
            .unwrap();
        assert_eq!(csv.height(), df.height());
        assert_eq!(csv.get_column_names()[0].as_str(), "time");
    }

    #[test]
    fn run_consolidates_every_location() {
        let raw = tempdir().unwrap();
        write_payload(raw.path(), "boston", 2019, 1, &[1_546_300_800]);
        write_payload(raw.path(), "albany", 2019, 1, &[1_546_300_800]);

        let out = tempdir().unwrap();
        let consolidator = Consolidator::new(raw.path(), out.path());
        consolidator.run(&NoopReporter).unwrap();

        for location in ["albany", "boston"] {
            assert!(out.path().join(format!("{location}_daily.csv")).is_file());
            assert!(out
                .path()
                .join(format!("{location}_daily.parquet"))
                .is_file());
        }
    }
}
