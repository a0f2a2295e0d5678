//! File output for finished geodesics.
//!
//! The [`GeodesicOutputHandler`] collects one record per geodesic (screen
//! index plus one string per diagnostic) and writes each diagnostic's
//! column to its own sequence of files. Ingestion is slot-addressed: the
//! driver announces each iteration's size up front, worker threads then
//! fill disjoint pre-sized slots under a short lock, so flushed files keep
//! pixel-slot order regardless of thread scheduling.
//!
//! Any file I/O error permanently flips the handler to console fallback;
//! the run continues and records go to stdout instead.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::sync::Mutex;

use log::{debug, warn};

use crate::tensor::LargeCounter;

/// One output record: the screen index string followed by one string per
/// diagnostic.
pub type GeodesicRecord = Vec<String>;

pub struct GeodesicOutputHandler {
    file_prefix: String,
    time_stamp: String,
    file_extension: String,
    diag_names: Vec<String>,
    /// Flush the cache once it holds more than this many sealed records.
    cache_limit: usize,
    /// Roll to a new file sequence number after this many records.
    geodesics_per_file: usize,
    first_line_info: Option<String>,
    inner: Mutex<SinkState>,
}

struct SinkState {
    /// Sealed records from prior iterations followed by the current
    /// iteration's pre-sized slots.
    cache: Vec<GeodesicRecord>,
    /// Number of sealed records at the front of `cache`.
    sealed: usize,
    /// Permanent console fallback after an I/O error.
    write_to_console: bool,
    /// Records already written into the current file sequence.
    geodesics_in_file: usize,
    /// Current file sequence number.
    file_seq: u32,
    /// Whether the current sequence's files have been created yet.
    seq_created: bool,
}

impl GeodesicOutputHandler {
    pub fn new(
        file_prefix: impl Into<String>,
        time_stamp: impl Into<String>,
        file_extension: impl Into<String>,
        diag_names: Vec<String>,
        cache_limit: usize,
        geodesics_per_file: usize,
        first_line_info: Option<String>,
    ) -> Self {
        Self {
            file_prefix: file_prefix.into(),
            time_stamp: time_stamp.into(),
            file_extension: file_extension.into(),
            diag_names,
            cache_limit,
            geodesics_per_file: geodesics_per_file.max(1),
            first_line_info,
            inner: Mutex::new(SinkState {
                cache: Vec::new(),
                sealed: 0,
                write_to_console: false,
                geodesics_in_file: 0,
                file_seq: 0,
                seq_created: false,
            }),
        }
    }

    /// Announce that `count` records are about to arrive. Seals whatever is
    /// already cached, flushes if the cache has outgrown its limit, and
    /// pre-sizes the new slots so submission never reallocates.
    pub fn prepare_for_output(&self, count: LargeCounter) {
        let mut state = self.inner.lock().expect("output sink lock poisoned");
        state.sealed = state.cache.len();
        if state.sealed > self.cache_limit {
            self.write_cached(&mut state);
        }
        let sealed = state.sealed;
        state.cache.resize(sealed + count as usize, Vec::new());
    }

    /// Store the record for slot `index` of the current iteration.
    /// Thread-safe; the critical section is a single slot write.
    pub fn submit(&self, index: LargeCounter, record: GeodesicRecord) {
        let mut state = self.inner.lock().expect("output sink lock poisoned");
        let slot = state.sealed + index as usize;
        state.cache[slot] = record;
    }

    /// No further output will arrive: write out everything still cached.
    pub fn finalize(&self) {
        let mut state = self.inner.lock().expect("output sink lock poisoned");
        state.sealed = state.cache.len();
        self.write_cached(&mut state);
    }

    fn file_name(&self, diag: &str, seq: u32) -> String {
        let mut parts = vec![self.file_prefix.as_str()];
        if !self.time_stamp.is_empty() {
            parts.push(self.time_stamp.as_str());
        }
        let seq_str = seq.to_string();
        parts.push(diag);
        parts.push(&seq_str);
        format!("{}.{}", parts.join("_"), self.file_extension)
    }

    fn write_cached(&self, state: &mut SinkState) {
        if state.cache.is_empty() {
            return;
        }
        if !state.write_to_console {
            if let Err(e) = self.try_write_files(state) {
                warn!("output file error ({e}); switching to console output");
                state.write_to_console = true;
            }
        }
        if state.write_to_console {
            for record in &state.cache {
                if record.len() != self.diag_names.len() + 1 {
                    continue;
                }
                for d in 0..self.diag_names.len() {
                    println!("{} {}", record[0], record[d + 1]);
                }
            }
        }
        state.cache.clear();
        state.sealed = 0;
    }

    fn try_write_files(&self, state: &mut SinkState) -> io::Result<()> {
        let mut writers = self.open_seq(state.file_seq, state.seq_created)?;
        state.seq_created = true;

        // Records are written in slot order; every diagnostic gets its
        // column of each record.
        for r in 0..state.cache.len() {
            if state.cache[r].is_empty() {
                warn!("skipping empty output record {r}");
                continue;
            }
            if state.cache[r].len() != self.diag_names.len() + 1 {
                warn!(
                    "output record {r} has {} entries, expected {}",
                    state.cache[r].len(),
                    self.diag_names.len() + 1
                );
                continue;
            }
            if state.geodesics_in_file >= self.geodesics_per_file {
                for w in &mut writers {
                    w.flush()?;
                }
                state.file_seq += 1;
                state.geodesics_in_file = 0;
                writers = self.open_seq(state.file_seq, false)?;
                state.seq_created = true;
            }
            for (d, w) in writers.iter_mut().enumerate() {
                writeln!(w, "{} {}", state.cache[r][0], state.cache[r][d + 1])?;
            }
            state.geodesics_in_file += 1;
        }
        for w in &mut writers {
            w.flush()?;
        }
        Ok(())
    }

    /// One writer per diagnostic for sequence `seq`. A sequence's files are
    /// truncated and given the first-line header on first creation, and
    /// appended to afterwards.
    fn open_seq(&self, seq: u32, already_created: bool) -> io::Result<Vec<BufWriter<File>>> {
        let mut writers = Vec::with_capacity(self.diag_names.len());
        for diag in &self.diag_names {
            let name = self.file_name(diag, seq);
            let mut writer = if already_created {
                BufWriter::new(OpenOptions::new().append(true).open(&name)?)
            } else {
                debug!("opening output file {name}");
                let mut w = BufWriter::new(File::create(&name)?);
                if let Some(info) = &self.first_line_info {
                    writeln!(w, "{info}")?;
                }
                w
            };
            writer.flush()?;
            writers.push(writer);
        }
        Ok(writers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn prefix_in(dir: &Path) -> String {
        dir.join("run").to_string_lossy().into_owned()
    }

    fn handler(dir: &Path, cache_limit: usize, per_file: usize) -> GeodesicOutputHandler {
        GeodesicOutputHandler::new(
            prefix_in(dir),
            "stamp",
            "dat",
            vec!["FourColorScreen".into(), "EquatPasses".into()],
            cache_limit,
            per_file,
            Some("header line".into()),
        )
    }

    fn record(i: u64) -> GeodesicRecord {
        vec![format!("{i} {i}"), format!("{}", i % 4), format!("{i}")]
    }

    #[test]
    fn per_diagnostic_files_carry_their_columns() {
        let dir = tempfile::tempdir().unwrap();
        let sink = handler(dir.path(), 1000, 1000);
        sink.prepare_for_output(3);
        // Out-of-order submission still lands in slot order.
        sink.submit(2, record(2));
        sink.submit(0, record(0));
        sink.submit(1, record(1));
        sink.finalize();

        let four = fs::read_to_string(format!("{}_stamp_FourColorScreen_0.dat", prefix_in(dir.path()))).unwrap();
        let lines: Vec<&str> = four.lines().collect();
        assert_eq!(lines[0], "header line");
        assert_eq!(lines[1], "0 0 0");
        assert_eq!(lines[2], "1 1 1");
        assert_eq!(lines[3], "2 2 2");

        let passes = fs::read_to_string(format!("{}_stamp_EquatPasses_0.dat", prefix_in(dir.path()))).unwrap();
        assert_eq!(passes.lines().nth(2).unwrap(), "1 1 1");
    }

    #[test]
    fn files_roll_after_geodesics_per_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = handler(dir.path(), 0, 2);
        sink.prepare_for_output(5);
        for i in 0..5 {
            sink.submit(i, record(i));
        }
        sink.finalize();

        for seq in 0..3 {
            let name = format!(
                "{}_stamp_FourColorScreen_{seq}.dat",
                prefix_in(dir.path())
            );
            let content = fs::read_to_string(&name).unwrap();
            let data_lines = content.lines().skip(1).count();
            let expected = if seq == 2 { 1 } else { 2 };
            assert_eq!(data_lines, expected, "wrong record count in {name}");
        }
    }

    #[test]
    fn union_of_files_is_the_submitted_multiset() {
        let dir = tempfile::tempdir().unwrap();
        let sink = handler(dir.path(), 3, 4);
        // Three iterations with a small cache limit force mid-run flushes.
        let mut submitted = Vec::new();
        for iteration in 0..3u64 {
            sink.prepare_for_output(4);
            for i in 0..4u64 {
                let r = record(iteration * 4 + i);
                submitted.push(format!("{} {}", r[0], r[1]));
                sink.submit(i, r);
            }
        }
        sink.finalize();

        let mut written = Vec::new();
        for seq in 0.. {
            let name = format!(
                "{}_stamp_FourColorScreen_{seq}.dat",
                prefix_in(dir.path())
            );
            let Ok(content) = fs::read_to_string(&name) else {
                break;
            };
            for line in content.lines().skip(1) {
                written.push(line.to_string());
            }
        }
        submitted.sort();
        written.sort();
        assert_eq!(written, submitted);
    }

    #[test]
    fn append_across_flushes_keeps_existing_records() {
        let dir = tempfile::tempdir().unwrap();
        let sink = handler(dir.path(), 0, 1000);
        sink.prepare_for_output(1);
        sink.submit(0, record(0));
        // cache (1) > limit (0) at next prepare: flush happens here.
        sink.prepare_for_output(1);
        sink.submit(0, record(1));
        sink.finalize();

        let four = fs::read_to_string(format!(
            "{}_stamp_FourColorScreen_0.dat",
            prefix_in(dir.path())
        ))
        .unwrap();
        let lines: Vec<&str> = four.lines().collect();
        assert_eq!(lines, vec!["header line", "0 0 0", "1 1 1"]);
    }

    #[test]
    fn timestampless_names_skip_the_segment() {
        let dir = tempfile::tempdir().unwrap();
        let sink = GeodesicOutputHandler::new(
            prefix_in(dir.path()),
            "",
            "dat",
            vec!["FourColorScreen".into()],
            10,
            10,
            None,
        );
        sink.prepare_for_output(1);
        sink.submit(0, record(0));
        sink.finalize();
        let name = format!("{}_FourColorScreen_0.dat", prefix_in(dir.path()));
        let content = fs::read_to_string(name).unwrap();
        assert_eq!(content.lines().next().unwrap(), "0 0 0");
    }
}
