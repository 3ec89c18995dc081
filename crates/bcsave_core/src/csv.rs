use std::fmt;

const PKCS7_BLOCK_SIZE: usize = 16;
const COMMENT_MARKER: &str = "//";
const LINE_TERMINATOR: &str = "\r\n";

static EMPTY_CELL: Cell = Cell {
    text: String::new(),
};
static EMPTY_ROW: Row = Row { cells: Vec::new() };

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delimiter {
    #[default]
    Comma,
    Tab,
    Pipe,
}

impl Delimiter {
    /// Localized tables use a comma in the Japanese release and a pipe elsewhere.
    pub fn for_country_code(cc: &str) -> Self {
        if cc.eq_ignore_ascii_case("jp") {
            Self::Comma
        } else {
            Self::Pipe
        }
    }

    pub fn as_char(&self) -> char {
        match *self {
            Self::Comma => ',',
            Self::Tab => '\t',
            Self::Pipe => '|',
        }
    }

    pub fn as_byte(&self) -> u8 {
        match *self {
            Self::Comma => b',',
            Self::Tab => b'\t',
            Self::Pipe => b'|',
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    pub delimiter: Delimiter,
    pub remove_padding: bool,
    pub remove_comments: bool,
    pub remove_empty: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: Delimiter::Comma,
            remove_padding: true,
            remove_comments: true,
            remove_empty: true,
        }
    }
}

impl CsvOptions {
    pub fn with_delimiter(delimiter: Delimiter) -> Self {
        Self {
            delimiter,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cell {
    text: String,
}

impl Cell {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn to_int(&self) -> i32 {
        self.text.trim().parse().unwrap_or(0)
    }

    pub fn to_bool(&self) -> bool {
        let trimmed = self.text.trim();
        if trimmed.eq_ignore_ascii_case("true") {
            return true;
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return false;
        }
        trimmed.parse::<i64>().map(|v| v != 0).unwrap_or(false)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    cells: Vec<Cell>,
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    pub fn from_values<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        Self {
            cells: values.into_iter().map(|v| Cell::new(v.to_string())).collect(),
        }
    }

    /// Cell at `index`, or an empty cell when the row is shorter.
    pub fn cell(&self, index: usize) -> &Cell {
        self.cells.get(index).unwrap_or(&EMPTY_CELL)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cell> {
        self.cells.iter()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn to_strings(&self) -> Vec<String> {
        self.cells.iter().map(|c| c.text.clone()).collect()
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = &'a Cell;
    type IntoIter = std::slice::Iter<'a, Cell>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Csv {
    lines: Vec<Row>,
    delimiter: Delimiter,
    index: usize,
}

impl Default for Csv {
    fn default() -> Self {
        Self::new(Delimiter::default())
    }
}

impl Csv {
    pub fn new(delimiter: Delimiter) -> Self {
        Self {
            lines: Vec::new(),
            delimiter,
            index: 0,
        }
    }

    /// Parses a table leniently: short rows and missing cells read as empty,
    /// and quoted delimiters still split once the quotes are dropped.
    pub fn parse(bytes: &[u8], options: CsvOptions) -> Self {
        let bytes = if options.remove_padding {
            unpad_pkcs7(bytes)
        } else {
            bytes
        };
        let text = String::from_utf8_lossy(bytes);
        let delim = options.delimiter.as_char();

        let mut lines = Vec::new();
        for line in split_lines(&text) {
            let mut full_row = join_record(line, options.delimiter);
            if options.remove_comments
                && let Some(cut) = full_row.find(COMMENT_MARKER)
            {
                full_row.truncate(cut);
            }

            let mut cells = Vec::new();
            for item in full_row.split(delim) {
                let item = item.trim();
                if !item.is_empty() || !options.remove_empty {
                    cells.push(Cell::new(item));
                }
            }
            if !cells.is_empty() || !options.remove_empty {
                lines.push(Row::new(cells));
            }
        }

        Self {
            lines,
            delimiter: options.delimiter,
            index: 0,
        }
    }

    pub fn delimiter(&self) -> Delimiter {
        self.delimiter
    }

    /// Row at `index`, or an empty row past the end of the table.
    pub fn row(&self, index: usize) -> &Row {
        self.lines.get(index).unwrap_or(&EMPTY_ROW)
    }

    pub fn rows(&self) -> &[Row] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Next row under the forward cursor; `None` once every row was read.
    pub fn read_line(&mut self) -> Option<&Row> {
        let line = self.lines.get(self.index)?;
        self.index += 1;
        Some(line)
    }

    pub fn has_line(&self) -> bool {
        self.index < self.lines.len()
    }

    pub fn reset_index(&mut self) {
        self.index = 0;
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.lines.iter()
    }

    pub fn add_line<I, T>(&mut self, values: I)
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        self.lines.push(Row::from_values(values));
    }

    /// Replaces row `index`, appending instead when the index is past the end.
    pub fn set_line<I, T>(&mut self, index: usize, values: I)
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        let row = Row::from_values(values);
        match self.lines.get_mut(index) {
            Some(slot) => *slot = row,
            None => self.lines.push(row),
        }
    }

    pub fn extend(&mut self, length: usize, sub_length: usize) {
        for _ in 0..length {
            self.lines.push(Row::new(vec![Cell::default(); sub_length]));
        }
    }

    pub fn to_data(&self) -> String {
        let delim = self.delimiter.as_char();
        let mut out = String::new();
        for line in &self.lines {
            for (i, cell) in line.iter().enumerate() {
                if i > 0 {
                    out.push(delim);
                }
                out.push_str(cell.as_str());
            }
            out.push_str(LINE_TERMINATOR);
        }
        out
    }
}

impl<'a> IntoIterator for &'a Csv {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}

/// Strips PKCS#7 padding (16-byte blocks). Input that is not validly padded is
/// returned unchanged.
pub fn unpad_pkcs7(bytes: &[u8]) -> &[u8] {
    if bytes.is_empty() || bytes.len() % PKCS7_BLOCK_SIZE != 0 {
        return bytes;
    }
    let pad = bytes[bytes.len() - 1] as usize;
    if pad == 0 || pad > PKCS7_BLOCK_SIZE {
        return bytes;
    }
    let (body, padding) = bytes.split_at(bytes.len() - pad);
    if padding.iter().all(|&b| b as usize == pad) {
        body
    } else {
        bytes
    }
}

// Splits on `\r\n`, `\n` and a bare `\r`. A trailing terminator does not
// start an extra line.
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        match rest.find(['\r', '\n']) {
            Some(end) => {
                lines.push(&rest[..end]);
                let width = if rest[end..].starts_with("\r\n") { 2 } else { 1 };
                rest = &rest[end + width..];
            }
            None => {
                lines.push(rest);
                break;
            }
        }
    }
    lines
}

// Reads one line as a delimited record and joins its unquoted fields back
// with the plain delimiter. A line the reader rejects is kept as it is.
fn join_record(line: &str, delimiter: Delimiter) -> String {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter.as_byte())
        .from_reader(line.as_bytes());
    let mut record = csv::ByteRecord::new();
    match reader.read_byte_record(&mut record) {
        Ok(true) => record
            .iter()
            .map(String::from_utf8_lossy)
            .collect::<Vec<_>>()
            .join(delimiter.to_string().as_str()),
        Ok(false) => String::new(),
        Err(_) => line.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(csv: &Csv) -> Vec<Vec<String>> {
        csv.iter().map(Row::to_strings).collect()
    }

    #[test]
    fn strips_comments_and_empty_cells() {
        let csv = Csv::parse(b"a,b//comment\n,c,\n", CsvOptions::default());
        assert_eq!(rows(&csv), vec![vec!["a", "b"], vec!["c"]]);
    }

    #[test]
    fn keeps_empty_cells_when_asked() {
        let options = CsvOptions {
            remove_empty: false,
            ..CsvOptions::default()
        };
        let csv = Csv::parse(b",c,\n\n", options);
        assert_eq!(rows(&csv), vec![vec!["", "c", ""], vec![""]]);
    }

    #[test]
    fn comment_only_line_is_dropped() {
        let csv = Csv::parse(b"// header\n1,2\n", CsvOptions::default());
        assert_eq!(csv.len(), 1);
        assert_eq!(csv.row(0).cell(1).to_int(), 2);
    }

    #[test]
    fn pipe_and_tab_delimiters() {
        let pipe = Csv::parse(b"x | y\r\nz\r\n", CsvOptions::with_delimiter(Delimiter::Pipe));
        assert_eq!(rows(&pipe), vec![vec!["x", "y"], vec!["z"]]);

        let tab = Csv::parse(b"1\t2\t3\n", CsvOptions::with_delimiter(Delimiter::Tab));
        assert_eq!(rows(&tab), vec![vec!["1", "2", "3"]]);
    }

    #[test]
    fn quoted_fields_lose_their_quotes() {
        let csv = Csv::parse(b"\"Cat, Basic\",\"say \"\"nyan\"\"\"\n", CsvOptions::default());
        assert_eq!(rows(&csv), vec![vec!["Cat", "Basic", "say \"nyan\""]]);
    }

    #[test]
    fn bare_carriage_returns_end_lines() {
        let csv = Csv::parse(b"1,2\r3,4\r\n5\n\r6\r", CsvOptions::default());
        assert_eq!(
            rows(&csv),
            vec![vec!["1", "2"], vec!["3", "4"], vec!["5"], vec!["6"]]
        );

        let options = CsvOptions {
            remove_empty: false,
            ..CsvOptions::default()
        };
        assert_eq!(Csv::parse(b"a\r\rb", options).len(), 3);
    }

    #[test]
    fn quote_inside_unquoted_field_is_literal() {
        let csv = Csv::parse(b"say \"hi\",\"x\"y\n", CsvOptions::default());
        assert_eq!(rows(&csv), vec![vec!["say \"hi\"", "xy"]]);
    }

    #[test]
    fn removes_valid_padding_only() {
        let mut padded = b"1,2\n".to_vec();
        padded.extend(std::iter::repeat_n(12u8, 12));
        let csv = Csv::parse(&padded, CsvOptions::default());
        assert_eq!(rows(&csv), vec![vec!["1", "2"]]);

        assert_eq!(unpad_pkcs7(b"abc"), b"abc");
        let mut bad = vec![b'a'; 15];
        bad.push(3);
        assert_eq!(unpad_pkcs7(&bad), bad.as_slice());
    }

    #[test]
    fn out_of_range_access_is_empty() {
        let csv = Csv::parse(b"1\n", CsvOptions::default());
        assert!(csv.row(5).is_empty());
        assert!(csv.row(0).cell(3).is_empty());
        assert_eq!(csv.row(0).cell(3).to_int(), 0);
    }

    #[test]
    fn cell_conversions_default_on_failure() {
        assert_eq!(Cell::new(" 42 ").to_int(), 42);
        assert_eq!(Cell::new("-7").to_int(), -7);
        assert_eq!(Cell::new("abc").to_int(), 0);
        assert!(Cell::new("1").to_bool());
        assert!(Cell::new("TRUE").to_bool());
        assert!(!Cell::new("0").to_bool());
        assert!(!Cell::new("maybe").to_bool());
    }

    #[test]
    fn read_line_cursor_stops_at_end() {
        let mut csv = Csv::parse(b"a\nb\n", CsvOptions::default());
        assert_eq!(csv.read_line().map(|r| r.cell(0).to_string()), Some("a".into()));
        assert!(csv.has_line());
        assert_eq!(csv.read_line().map(|r| r.cell(0).to_string()), Some("b".into()));
        assert!(csv.read_line().is_none());
        csv.reset_index();
        assert!(csv.has_line());
    }

    #[test]
    fn set_line_overwrites_or_appends() {
        let mut csv = Csv::new(Delimiter::Comma);
        csv.add_line([1, 2]);
        csv.set_line(0, ["x"]);
        csv.set_line(9, ["y", "z"]);
        assert_eq!(rows(&csv), vec![vec!["x"], vec!["y", "z"]]);
        assert_eq!(csv.to_data(), "x\r\ny,z\r\n");
    }

    #[test]
    fn extend_adds_rows_of_empty_cells() {
        let mut csv = Csv::new(Delimiter::Pipe);
        csv.extend(2, 3);
        assert_eq!(csv.len(), 2);
        assert_eq!(csv.row(1).len(), 3);
        assert_eq!(csv.to_data(), "||\r\n||\r\n");
    }

    #[test]
    fn reparse_of_serialized_table_is_stable() {
        let source = b"id,name,flag\n1,Basic Cat,true\n2,Tank Cat,0\n";
        let first = Csv::parse(source, CsvOptions::default());
        let second = Csv::parse(first.to_data().as_bytes(), CsvOptions::default());
        assert_eq!(rows(&first), rows(&second));
    }

    #[test]
    fn country_code_selects_delimiter() {
        assert_eq!(Delimiter::for_country_code("jp"), Delimiter::Comma);
        assert_eq!(Delimiter::for_country_code("en"), Delimiter::Pipe);
        assert_eq!(Delimiter::Pipe.to_string(), "|");
    }
}
