//! Retry filters built from a previous run's ledger.

use std::collections::BTreeSet;
use std::io::Read;

use camino::Utf8Path;
use geozip_core::Zip;
use log::warn;

use super::{LEDGER_HEADER, LedgerError};

/// Set of zips that failed in a previous run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryFilter {
    zips: BTreeSet<Zip>,
}

impl RetryFilter {
    /// Read a ledger and collect the zips of its rows.
    ///
    /// Rows with an empty or unparseable zip cannot be matched against input
    /// records and are skipped with a warning. Duplicate zips collapse.
    ///
    /// # Examples
    /// ```
    /// use geozip_core::Zip;
    /// use geozip_ingest::RetryFilter;
    ///
    /// let ledger = "Counter,Zip,Error\n3,10001,timeout\n9,10001,timeout\n11,,bad json\n";
    /// let filter = RetryFilter::from_reader(ledger.as_bytes())?;
    ///
    /// assert!(filter.contains(Zip::new(10001)));
    /// assert_eq!(filter.len(), 1);
    /// # Ok::<(), geozip_ingest::LedgerError>(())
    /// ```
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LedgerError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|source| LedgerError::Read { source })?;
        if headers.iter().ne(LEDGER_HEADER) {
            return Err(LedgerError::Header {
                found: headers.iter().map(str::to_owned).collect(),
            });
        }

        let mut zips = BTreeSet::new();
        for row in csv_reader.records() {
            let record = row.map_err(|source| LedgerError::Read { source })?;
            let raw = record.get(1).unwrap_or_default();
            match raw.parse::<Zip>() {
                Ok(zip) => {
                    zips.insert(zip);
                }
                Err(_) => {
                    let position = record.position().map_or(0, csv::Position::line);
                    warn!("ignoring ledger row at line {position} with zip {raw:?}");
                }
            }
        }
        Ok(Self { zips })
    }

    /// Whether `zip` failed in the previous run.
    #[must_use]
    pub fn contains(&self, zip: Zip) -> bool {
        self.zips.contains(&zip)
    }

    /// Number of distinct zips.
    #[must_use]
    pub fn len(&self) -> usize {
        self.zips.len()
    }

    /// Whether no zips are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zips.is_empty()
    }

    /// Held zips in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = Zip> + '_ {
        self.zips.iter().copied()
    }
}

impl FromIterator<Zip> for RetryFilter {
    fn from_iter<I: IntoIterator<Item = Zip>>(iter: I) -> Self {
        Self {
            zips: iter.into_iter().collect(),
        }
    }
}

/// Load the retry filter from the ledger file at `path`.
pub fn load_failed_zips(path: &Utf8Path) -> Result<RetryFilter, LedgerError> {
    let file = geozip_fs::open_utf8_file(path).map_err(|source| LedgerError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    RetryFilter::from_reader(file)
}
