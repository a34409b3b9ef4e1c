//! Tariff lookup by payload content
//!
//! Merchants are recognised by a marker somewhere in their payload (usually
//! part of the merchant name, e.g. `SBY KHUSUS`). The table file has one
//! `MARKER=TARIFF` entry per line; entries are tried in file order and the
//! first marker found in the payload wins.

use anyhow::{bail, Context, Result};
use std::path::Path;

/// Ordered marker to tariff mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TariffTable {
    entries: Vec<(String, String)>,
}

impl TariffTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(marker, tariff)` pairs in priority order
    pub fn from_entries<M: Into<String>, T: Into<String>>(entries: impl IntoIterator<Item = (M, T)>) -> Self {
        Self {
            entries: entries.into_iter().map(|(m, t)| (m.into(), t.into())).collect(),
        }
    }

    /// Parse `MARKER=TARIFF` lines; `#` comments and blank lines are skipped
    pub fn parse(text: &str) -> Result<Self> {
        let mut table = Self::new();
        for (line_num, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((marker, tariff)) = line.rsplit_once('=') else {
                bail!("Invalid tariff entry at line {}: '{}'. Expected MARKER=TARIFF", line_num + 1, line);
            };
            let (marker, tariff) = (marker.trim(), tariff.trim());
            if marker.is_empty() {
                bail!("Empty marker at line {}", line_num + 1);
            }
            if tariff.is_empty() || !tariff.bytes().all(|b| b.is_ascii_digit()) {
                bail!("Invalid tariff '{}' at line {}", tariff, line_num + 1);
            }
            table.entries.push((marker.to_string(), tariff.to_string()));
        }
        Ok(table)
    }

    /// Read a tariff table file
    pub fn read_from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read tariff table: {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Failed to parse tariff table: {}", path.display()))
    }

    /// Tariff of the first marker contained in `payload`
    pub fn lookup(&self, payload: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(marker, _)| payload.contains(marker.as_str()))
            .map(|(_, tariff)| tariff.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TARIFFS: &str = "# city routes\nSBY REGULER=6200\nSBY KHUSUS=2000\n\nBMS REGULER = 3900\n";

    #[test]
    fn test_parse_and_lookup() {
        let table = TariffTable::parse(TARIFFS).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.lookup("...5920KEMENHUB SBY REGULER6008SURABAYA..."), Some("6200"));
        assert_eq!(table.lookup("KEMENHUB BMS REGULER"), Some("3900"));
        assert_eq!(table.lookup("KEMENHUB PLG REGULER"), None);
    }

    #[test]
    fn test_lookup_first_match_wins() {
        let table = TariffTable::from_entries([("SBY", "1"), ("SBY KHUSUS", "2")]);
        assert_eq!(table.lookup("SBY KHUSUS"), Some("1"));
    }

    #[test]
    fn test_lookup_empty_table() {
        assert_eq!(TariffTable::new().lookup("anything"), None);
    }

    #[test]
    fn test_parse_missing_separator() {
        let err = TariffTable::parse("SBY REGULER 6200").unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_parse_non_numeric_tariff() {
        assert!(TariffTable::parse("SBY=abc").is_err());
        assert!(TariffTable::parse("=6200").is_err());
    }
}
