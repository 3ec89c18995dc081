use std::fs;
use std::path::PathBuf;

use bcsave_core::csv::{Csv, CsvOptions, Delimiter, unpad_pkcs7};
use bcsave_core::story::Era;
use bcsave_core::treasure::TreasureGroups;

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..")
}

fn pkcs7_pad(data: &[u8]) -> Vec<u8> {
    let pad = 16 - data.len() % 16;
    let mut out = data.to_vec();
    out.extend(std::iter::repeat_n(pad as u8, pad));
    out
}

#[test]
fn comments_and_empty_cells_are_dropped() {
    let csv = Csv::parse(b"a,b//comment\n,c,\n", CsvOptions::default());
    let rows: Vec<Vec<String>> = csv.iter().map(|row| row.to_strings()).collect();
    assert_eq!(rows, vec![vec!["a", "b"], vec!["c"]]);
}

#[test]
fn serialized_table_parses_back_to_the_same_rows() {
    let text = "id|name|flag\n1|Cat|true\n2|Tank Cat|0\n";
    let options = CsvOptions::with_delimiter(Delimiter::Pipe);
    let first = Csv::parse(text.as_bytes(), options);
    let second = Csv::parse(first.to_data().as_bytes(), options);

    assert_eq!(first.rows(), second.rows());
    assert!(first.to_data().ends_with("\r\n"));
    assert_eq!(second.row(2).cell(1).as_str(), "Tank Cat");
    assert!(second.row(1).cell(2).to_bool());
    assert!(!second.row(2).cell(2).to_bool());
}

#[test]
fn padded_input_is_unpadded_before_parsing() {
    let padded = pkcs7_pad(b"10,20\n30,40\n");
    assert_eq!(padded.len() % 16, 0);
    assert_eq!(unpad_pkcs7(&padded), b"10,20\n30,40\n");

    let csv = Csv::parse(&padded, CsvOptions::default());
    assert_eq!(csv.len(), 2);
    assert_eq!(csv.row(1).cell(1).to_int(), 40);
}

#[test]
fn cursor_and_index_access_are_lenient() {
    let mut csv = Csv::parse(b"1,2\n3\n", CsvOptions::default());
    assert_eq!(csv.read_line().map(|r| r.len()), Some(2));
    assert_eq!(csv.read_line().map(|r| r.cell(0).to_int()), Some(3));
    assert!(csv.read_line().is_none());
    assert!(!csv.has_line());

    assert!(csv.row(10).is_empty());
    assert_eq!(csv.row(1).cell(5).to_int(), 0);

    csv.reset_index();
    assert!(csv.has_line());
}

#[test]
fn treasure_table_yields_eleven_groups() {
    assert_eq!(
        TreasureGroups::data_file_name(Era::EmpireOfCats),
        "treasureData0.csv"
    );
    let path = workspace_root().join("tests/fixtures/treasureData0.csv");
    let bytes = fs::read(&path).unwrap_or_else(|e| panic!("failed to read {:?}: {}", path, e));
    let groups = TreasureGroups::from_csv(&Csv::parse(&bytes, CsvOptions::default()));

    assert_eq!(groups.len(), 11);
    assert_eq!(groups.group(0), Some(&[0, 1, 2][..]));
    assert_eq!(groups.group(2), Some(&[6, 7][..]));
    assert_eq!(groups.group(10), Some(&[26, 27, 28, 29][..]));
    assert_eq!(groups.group(11), None);
}

#[test]
fn treasure_table_with_carriage_return_line_endings() {
    let path = workspace_root().join("tests/fixtures/treasureData0.csv");
    let bytes = fs::read(&path).unwrap_or_else(|e| panic!("failed to read {:?}: {}", path, e));
    let cr_only: Vec<u8> = bytes
        .iter()
        .map(|&b| if b == b'\n' { b'\r' } else { b })
        .collect();

    let groups = TreasureGroups::from_csv(&Csv::parse(&cr_only, CsvOptions::default()));
    assert_eq!(groups.len(), 11);
    assert_eq!(groups.group(10), Some(&[26, 27, 28, 29][..]));
}

#[test]
fn quoted_cells_follow_the_common_dialect() {
    let csv = Csv::parse(
        b"\"Basic Cat\",\"a \"\"b\"\"\",3\n\"x|y\"|z\n",
        CsvOptions::default(),
    );
    assert_eq!(csv.row(0).to_strings(), vec!["Basic Cat", "a \"b\"", "3"]);
    assert_eq!(csv.row(1).to_strings(), vec!["x|y|z"]);
}
