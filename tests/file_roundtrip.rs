//! File-backed table, tariff and directive handling

use qris_tlv::{
    verify_crc, Directive, Mode, Processor, RowStatus, Table, TariffTable,
};
use std::fs;

const SAMPLE: &str = "00020101021126690014ID.CO.QRIS.WWW01189360091530000001230218ID10200211112223330303UMI51440014ID.CO.QRIS.WWW0215ID10200211112220303UMI5204411153033605802ID5920KEMENHUB SBY REGULER6008SURABAYA61056011163047B91";

#[test]
fn test_batch_tlv_through_files() {
    let dir = tempfile::tempdir().unwrap();

    let tariff_path = dir.path().join("tariffs.txt");
    fs::write(&tariff_path, "SBY REGULER=6200\nSBY KHUSUS=2000\n").unwrap();
    let tariffs = TariffTable::read_from_path(&tariff_path).unwrap();

    let mut table = Table::new(["filename", "qrstring", "tarif"]);
    let tariff = tariffs.lookup(SAMPLE).unwrap_or_default().to_string();
    table
        .push_row(vec!["gate1.png".to_string(), SAMPLE.to_string(), tariff])
        .unwrap();

    let table_path = dir.path().join("list.tsv");
    table.write_to_path(&table_path).unwrap();

    let directive_path = dir.path().join("modify.cfg");
    fs::write(&directive_path, "# set amount\n+|54||$tarif\n").unwrap();
    let directives = Directive::parse_content(&fs::read_to_string(&directive_path).unwrap()).unwrap();

    let mut table = Table::read_from_path(&table_path).unwrap();
    let reports = Processor::new(Mode::Tlv { directives }).process_table(&mut table).unwrap();
    assert_eq!(reports[0].status, RowStatus::Modified { diagnostics: Vec::new() });

    let out_path = dir.path().join("out.tsv");
    table.write_to_path(&out_path).unwrap();

    let written = Table::read_from_path(&out_path).unwrap();
    let payload = written.get(0, "qrstring").unwrap();
    assert!(payload.contains("54046200"));
    assert!(payload.ends_with("6304E0FE"));
    assert_eq!(verify_crc(payload), Ok(true));
}

#[test]
fn test_batch_legacy_through_files() {
    let dir = tempfile::tempdir().unwrap();
    let table_path = dir.path().join("list.tsv");
    fs::write(
        &table_path,
        format!("filename\tqrstring\ttarif\ngate1.png\t{}\t6200\ngate2.png\t{}\t\n", SAMPLE, SAMPLE),
    )
    .unwrap();

    let mut table = Table::read_from_path(&table_path).unwrap();
    let reports = Processor::new(Mode::Legacy { rewrite_prefix: true })
        .process_table(&mut table)
        .unwrap();

    let first = table.get(0, "qrstring").unwrap();
    assert!(first.starts_with("000201010212"));
    assert!(first.ends_with("63044D59"));

    // No tariff: left untouched and reported
    assert_eq!(table.get(1, "qrstring"), Some(SAMPLE));
    match &reports[1].status {
        RowStatus::Modified { diagnostics } => assert_eq!(diagnostics.len(), 1),
        other => panic!("unexpected status: {:?}", other),
    }
}

#[test]
fn test_read_missing_table_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Table::read_from_path(&dir.path().join("absent.tsv")).unwrap_err();
    assert!(err.to_string().contains("Failed to read table"));
}
