//! Ingest Service
//!
//! The bulk-load pipeline: discover dump files under a root directory, fan
//! them out to a pool of workers over a shared index cursor, decode and
//! filter rows, and persist candidates in fixed-size chunks that skip
//! (ticker, date) duplicates.
//!
//! Error containment follows the row/file/chunk boundaries: a malformed row
//! is dropped, a failed chunk is logged and the file continues, a failed
//! file is logged and the run continues. Only a missing source directory
//! aborts. Re-running over already-ingested files is a no-op.

use crate::db::sqlite::models::PricePoint;
use crate::db::SqliteDb;
use crate::error::{AppError, Result};
use crate::feed::{normalize_ticker, PriceRow, RowFilter};
use crate::reconcile::AssetLookup;
use chrono::{Duration, Utc};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Upper bound on concurrent file workers
const MAX_WORKERS: usize = 16;

/// Bulk-load configuration, one per run
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Root directory searched (recursively) for `.csv`/`.txt` dumps
    pub root: PathBuf,
    /// Discard rows older than this many days; `None` keeps everything
    pub lookback_days: Option<i64>,
    /// Required period code (`D` for daily); `None` accepts all
    pub period: Option<String>,
    pub workers: usize,
    pub chunk_size: usize,
    /// Parse and filter but never insert
    pub dry_run: bool,
    /// Drop files and rows whose ticker is not in the asset lookup
    pub known_only: bool,
}

/// Run totals, reported once at the end
#[derive(Debug, Default, Clone)]
pub struct IngestReport {
    pub files: usize,
    pub files_skipped: u64,
    pub files_failed: u64,
    pub candidates: u64,
    pub inserted: u64,
    pub skipped: u64,
}

struct IngestShared {
    db: Arc<SqliteDb>,
    lookup: Arc<AssetLookup>,
    filter: RowFilter,
    files: Vec<PathBuf>,
    /// Next unclaimed file index; each index is handed out exactly once
    cursor: AtomicUsize,
    chunk_size: usize,
    dry_run: bool,
    known_only: bool,
    candidates: AtomicU64,
    inserted: AtomicU64,
    skipped: AtomicU64,
    files_skipped: AtomicU64,
    files_failed: AtomicU64,
}

/// Bulk OHLCV ingestion
pub struct IngestService;

impl IngestService {
    /// Run the bulk pipeline to completion and return the run totals.
    pub async fn run(
        db: Arc<SqliteDb>,
        lookup: Arc<AssetLookup>,
        options: IngestOptions,
    ) -> Result<IngestReport> {
        let files = discover_files(&options.root)?;
        if files.is_empty() {
            warn!("No .csv/.txt files under {}", options.root.display());
            return Ok(IngestReport::default());
        }

        let cutoff = options
            .lookback_days
            .map(|days| Utc::now().date_naive() - Duration::days(days));
        let workers = options.workers.clamp(1, MAX_WORKERS);

        info!(
            "Ingesting {} files with {} workers (chunk size {}, period {:?}, cutoff {:?})",
            files.len(),
            workers,
            options.chunk_size.max(1),
            options.period,
            cutoff,
        );

        let shared = Arc::new(IngestShared {
            db,
            lookup,
            filter: RowFilter::new(cutoff, options.period),
            files,
            cursor: AtomicUsize::new(0),
            chunk_size: options.chunk_size.max(1),
            dry_run: options.dry_run,
            known_only: options.known_only,
            candidates: AtomicU64::new(0),
            inserted: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            files_skipped: AtomicU64::new(0),
            files_failed: AtomicU64::new(0),
        });

        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let shared = Arc::clone(&shared);
            handles.push(tokio::spawn(worker_loop(worker_id, shared)));
        }

        for handle in handles {
            if let Err(e) = handle.await {
                error!("Ingest worker panicked: {}", e);
            }
        }

        let report = IngestReport {
            files: shared.files.len(),
            files_skipped: shared.files_skipped.load(Ordering::Relaxed),
            files_failed: shared.files_failed.load(Ordering::Relaxed),
            candidates: shared.candidates.load(Ordering::Relaxed),
            inserted: shared.inserted.load(Ordering::Relaxed),
            skipped: shared.skipped.load(Ordering::Relaxed),
        };

        info!(
            "Ingest complete: {} files ({} skipped, {} failed), {} candidates, {} inserted, {} duplicates skipped",
            report.files,
            report.files_skipped,
            report.files_failed,
            report.candidates,
            report.inserted,
            report.skipped,
        );

        Ok(report)
    }
}

async fn worker_loop(worker_id: usize, shared: Arc<IngestShared>) {
    loop {
        let index = shared.cursor.fetch_add(1, Ordering::SeqCst);
        let Some(path) = shared.files.get(index) else {
            break;
        };

        if let Err(e) = process_file(path, &shared).await {
            shared.files_failed.fetch_add(1, Ordering::Relaxed);
            warn!("Worker {}: failed to process {}: {}", worker_id, path.display(), e);
        }
    }
}

async fn process_file(path: &Path, shared: &IngestShared) -> Result<()> {
    if shared.known_only {
        let file_ticker = ticker_from_filename(path);
        if !shared.lookup.contains(&file_ticker) {
            shared.files_skipped.fetch_add(1, Ordering::Relaxed);
            debug!("Skipping {}: no asset for '{}'", path.display(), file_ticker);
            return Ok(());
        }
    }

    let contents = tokio::fs::read_to_string(path).await?;
    let candidates =
        collect_candidates(&contents, &shared.filter, &shared.lookup, shared.known_only);

    shared
        .candidates
        .fetch_add(candidates.len() as u64, Ordering::Relaxed);

    if candidates.is_empty() {
        return Ok(());
    }

    if shared.dry_run {
        info!("[dry-run] {}: {} candidate rows", path.display(), candidates.len());
        return Ok(());
    }

    for (chunk_index, chunk) in candidates.chunks(shared.chunk_size).enumerate() {
        match shared.db.insert_prices_ignore(chunk) {
            Ok(inserted) => {
                shared.inserted.fetch_add(inserted as u64, Ordering::Relaxed);
                shared
                    .skipped
                    .fetch_add((chunk.len() - inserted) as u64, Ordering::Relaxed);
            }
            Err(e) => {
                // A failed chunk does not abort the file or the run.
                error!("{}: chunk {} insert failed: {}", path.display(), chunk_index, e);
            }
        }
    }

    Ok(())
}

/// Decode file contents into persistable candidates, in row order.
fn collect_candidates(
    contents: &str,
    filter: &RowFilter,
    lookup: &AssetLookup,
    known_only: bool,
) -> Vec<PricePoint> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(contents.as_bytes());

    let mut points = Vec::new();
    for record in reader.records() {
        let Ok(record) = record else { continue };
        let Some(row) = PriceRow::from_record(&record) else {
            continue;
        };
        if !filter.accepts(&row) {
            continue;
        }

        let asset_id = lookup.resolve(&row.ticker);
        if known_only && asset_id.is_none() {
            continue;
        }

        points.push(PricePoint {
            asset_id,
            date: row.date(),
            ticker: row.ticker,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }

    points
}

/// Find all `.csv`/`.txt` files under `root`, recursively, sorted.
pub fn discover_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(AppError::Config(format!(
            "Source directory '{}' does not exist",
            root.display()
        )));
    }

    let mut files = Vec::new();
    let mut dirs = vec![root.to_path_buf()];

    while let Some(dir) = dirs.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_dir() {
                dirs.push(path);
            } else if has_price_extension(&path) {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

fn has_price_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv") || ext.eq_ignore_ascii_case("txt"))
        .unwrap_or(false)
}

/// Canonical ticker from a dump filename (`aapl.us.txt` → `AAPL`)
fn ticker_from_filename(path: &Path) -> String {
    normalize_ticker(path.file_stem().and_then(|stem| stem.to_str()).unwrap_or(""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::AssetRef;
    use std::io::Write;

    const STOOQ_HEADER: &str = "<TICKER>,<PER>,<DATE>,<TIME>,<OPEN>,<HIGH>,<LOW>,<CLOSE>,<VOL>,<OPENINT>";

    fn write_file(dir: &Path, name: &str, lines: &[&str]) {
        let mut file = std::fs::File::create(dir.join(name)).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
    }

    fn fixture() -> (tempfile::TempDir, Arc<SqliteDb>, Arc<AssetLookup>) {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        std::fs::create_dir(&data).unwrap();

        write_file(
            &data,
            "aapl.us.txt",
            &[
                STOOQ_HEADER,
                "AAPL.US,D,20240102,0,185.0,186.5,184.0,186.0,1000000,0",
                "AAPL.US,D,20240103,0,186.0,187.0,185.0,186.5,900000,0",
                "AAPL.US,W,20240105,0,185.0,188.0,184.0,187.0,5000000,0",
                "AAPL.US,D,garbage,0,1,2,3,4,5,0",
            ],
        );
        write_file(
            &data,
            "msft.us.txt",
            &[
                STOOQ_HEADER,
                "MSFT.US,D,20240102,0,370.0,372.0,368.0,371.0,800000,0",
            ],
        );
        write_file(
            &data,
            "zzzz.us.csv",
            &[STOOQ_HEADER, "ZZZZ.US,D,20240102,0,1.0,1.1,0.9,1.0,100,0"],
        );
        // Not a dump extension; must be ignored by discovery.
        write_file(&data, "notes.md", &["not a dump"]);

        let db = Arc::new(SqliteDb::new(&dir.path().join("prices.db")).unwrap());
        let lookup = Arc::new(AssetLookup::build(&[
            AssetRef {
                asset_id: 1,
                ticker: Some("AAPL".to_string()),
                clean_ticker: Some("AAPL.US".to_string()),
            },
            AssetRef {
                asset_id: 2,
                ticker: Some("MSFT".to_string()),
                clean_ticker: None,
            },
        ]));

        (dir, db, lookup)
    }

    fn options(root: &Path) -> IngestOptions {
        IngestOptions {
            root: root.to_path_buf(),
            lookback_days: None,
            period: Some("D".to_string()),
            workers: 4,
            chunk_size: 2,
            dry_run: false,
            known_only: false,
        }
    }

    #[test]
    fn test_discover_files_filters_and_sorts() {
        let (dir, _db, _lookup) = fixture();
        let files = discover_files(&dir.path().join("data")).unwrap();

        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["aapl.us.txt", "msft.us.txt", "zzzz.us.csv"]);
    }

    #[test]
    fn test_discover_missing_root_is_config_error() {
        let err = discover_files(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_ticker_from_filename() {
        assert_eq!(ticker_from_filename(Path::new("/data/aapl.us.txt")), "AAPL");
        assert_eq!(ticker_from_filename(Path::new("msft.csv")), "MSFT");
    }

    #[tokio::test]
    async fn test_ingest_filters_and_persists() {
        let (dir, db, lookup) = fixture();
        let report = IngestService::run(Arc::clone(&db), lookup, options(&dir.path().join("data")))
            .await
            .unwrap();

        // Weekly row, garbage-date row, and headers are all dropped.
        assert_eq!(report.files, 3);
        assert_eq!(report.candidates, 4);
        assert_eq!(report.inserted, 4);
        assert_eq!(report.skipped, 0);

        let summary = db.price_summary().unwrap();
        assert_eq!(summary.rows, 4);
        assert_eq!(summary.tickers, 3);

        // Rows carry their reconciled asset link (or none, for ZZZZ).
        let rows = db.price_export_rows().unwrap();
        let aapl = rows.iter().find(|r| r.ticker == "AAPL").unwrap();
        let zzzz = rows.iter().find(|r| r.ticker == "ZZZZ").unwrap();
        assert_eq!(aapl.asset_id, Some(1));
        assert_eq!(zzzz.asset_id, None);
    }

    #[tokio::test]
    async fn test_reingest_inserts_nothing() {
        let (dir, db, lookup) = fixture();
        let opts = options(&dir.path().join("data"));

        IngestService::run(Arc::clone(&db), Arc::clone(&lookup), opts.clone())
            .await
            .unwrap();
        let second = IngestService::run(Arc::clone(&db), lookup, opts).await.unwrap();

        assert_eq!(second.candidates, 4);
        assert_eq!(second.inserted, 0);
        assert_eq!(second.skipped, 4);
        assert_eq!(db.price_summary().unwrap().rows, 4);
    }

    #[tokio::test]
    async fn test_known_only_skips_unreconciled() {
        let (dir, db, lookup) = fixture();
        let mut opts = options(&dir.path().join("data"));
        opts.known_only = true;

        let report = IngestService::run(Arc::clone(&db), lookup, opts).await.unwrap();

        assert_eq!(report.files_skipped, 1);
        assert_eq!(report.candidates, 3);
        assert_eq!(db.price_summary().unwrap().tickers, 2);
    }

    #[tokio::test]
    async fn test_dry_run_inserts_nothing() {
        let (dir, db, lookup) = fixture();
        let mut opts = options(&dir.path().join("data"));
        opts.dry_run = true;

        let report = IngestService::run(Arc::clone(&db), lookup, opts).await.unwrap();

        assert_eq!(report.candidates, 4);
        assert_eq!(report.inserted, 0);
        assert_eq!(db.price_summary().unwrap().rows, 0);
    }
}
