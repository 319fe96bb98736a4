//! Text address traces
//!
//! One address per line, in hexadecimal with an optional `0x` prefix. A leading `R` or `W` access
//! marker is accepted and ignored, as the model only performs reads. Blank lines and `#` comments
//! are skipped

use std::io::BufRead;

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TraceFileError {
    #[error("couldn't read the trace: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: couldn't parse {text:?} as an address")]
    Malformed { line: usize, text: String },
    #[error("invalid trace pattern: {0}")]
    Pattern(#[from] regex::Error),
}

pub struct TraceParser {
    pattern: Regex,
}

impl TraceParser {
    pub fn new() -> Result<Self, TraceFileError> {
        Ok(Self {
            pattern: Regex::new(r"^(?:[RrWw][\s,:]+)?(?:0[xX])?(?P<address>[0-9a-fA-F]{1,16})$")?,
        })
    }

    /// Parses line `number` (counting from 1), returning `None` for lines which carry no address
    pub fn parse_line(&self, number: usize, line: &str) -> Result<Option<u64>, TraceFileError> {
        let content = match line.find('#') {
            Some(start) => &line[..start],
            None => line,
        }
        .trim();
        if content.is_empty() {
            return Ok(None);
        }
        self.pattern
            .captures(content)
            .and_then(|tokens| tokens.name("address"))
            .and_then(|digits| u64::from_str_radix(digits.as_str(), 16).ok())
            .map(Some)
            .ok_or_else(|| TraceFileError::Malformed {
                line: number,
                text: content.to_string(),
            })
    }

    /// Lazily reads addresses from `reader`, yielding the first error and then stopping
    pub fn addresses<R: BufRead>(&self, reader: R) -> Addresses<'_, R> {
        Addresses {
            parser: self,
            reader,
            buffer: Vec::new(),
            line: 0,
            done: false,
        }
    }
}

/// Iterator over the addresses of a trace, see [`TraceParser::addresses`]
pub struct Addresses<'a, R> {
    parser: &'a TraceParser,
    reader: R,
    buffer: Vec<u8>,
    line: usize,
    done: bool,
}

impl<R: BufRead> Addresses<'_, R> {
    fn next_line(&self) -> Result<Option<u64>, TraceFileError> {
        let text = std::str::from_utf8(&self.buffer).map_err(|_| TraceFileError::Malformed {
            line: self.line,
            text: String::from_utf8_lossy(&self.buffer).trim_end().to_string(),
        })?;
        self.parser.parse_line(self.line, text)
    }
}

impl<R: BufRead> Iterator for Addresses<'_, R> {
    type Item = Result<u64, TraceFileError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            self.buffer.clear();
            match self.reader.read_until(b'\n', &mut self.buffer) {
                Ok(0) => self.done = true,
                Ok(_) => {
                    self.line += 1;
                    match self.next_line() {
                        Ok(None) => {}
                        Ok(Some(address)) => return Some(Ok(address)),
                        Err(e) => {
                            self.done = true;
                            return Some(Err(e));
                        }
                    }
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::{Cursor, Write};

    use super::*;
    use crate::io::get_reader;

    #[test]
    fn accepts_common_forms() -> Result<(), TraceFileError> {
        let parser = TraceParser::new()?;
        assert_eq!(parser.parse_line(1, "1f")?, Some(0x1f));
        assert_eq!(parser.parse_line(1, "  0x7FFD0000  ")?, Some(0x7ffd_0000));
        assert_eq!(parser.parse_line(1, "R 0x40")?, Some(0x40));
        assert_eq!(parser.parse_line(1, "w,0x40 # store")?, Some(0x40));
        assert_eq!(parser.parse_line(1, "ffffffffffffffff\r\n")?, Some(u64::MAX));
        assert_eq!(parser.parse_line(1, "")?, None);
        assert_eq!(parser.parse_line(1, "   # header")?, None);
        assert!(matches!(parser.parse_line(7, "0xzz"), Err(TraceFileError::Malformed { line: 7, .. })));
        assert!(matches!(parser.parse_line(1, "1ffffffffffffffff"), Err(TraceFileError::Malformed { .. })));
        Ok(())
    }

    #[test]
    fn reports_line_numbers() -> Result<(), TraceFileError> {
        let parser = TraceParser::new()?;
        let trace = "# trace\n0x0\n0x40\n\nnot an address\n";
        match parser.addresses(Cursor::new(trace)).collect::<Result<Vec<_>, _>>() {
            Err(TraceFileError::Malformed { line, text }) => {
                assert_eq!(line, 5);
                assert_eq!(text, "not an address");
            }
            other => panic!("expected a parse failure, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn reports_line_numbers_for_invalid_utf8() -> Result<(), TraceFileError> {
        let parser = TraceParser::new()?;
        let mut addresses = parser.addresses(Cursor::new(&b"0x0\n0x40\n\xff\xfe\n0x80\n"[..]));
        assert_eq!(addresses.next().transpose()?, Some(0));
        assert_eq!(addresses.next().transpose()?, Some(0x40));
        match addresses.next() {
            Some(Err(TraceFileError::Malformed { line, .. })) => assert_eq!(line, 3),
            other => panic!("expected a parse failure, got {other:?}"),
        }
        // Reading stops at the first error
        assert!(addresses.next().is_none());
        Ok(())
    }

    #[test]
    fn yields_addresses_lazily() -> Result<(), TraceFileError> {
        let parser = TraceParser::new()?;
        let trace = "0x0\n0x40\nnot an address\n";
        let mut addresses = parser.addresses(Cursor::new(trace));
        // The malformed line isn't reached until it is asked for
        assert_eq!(addresses.next().transpose()?, Some(0));
        assert_eq!(addresses.next().transpose()?, Some(0x40));
        assert!(matches!(addresses.next(), Some(Err(TraceFileError::Malformed { line: 3, .. }))));
        Ok(())
    }

    #[test]
    fn reads_from_file() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "0x0\n0x400\nR 0x0")?;
        file.flush()?;
        let reader = get_reader(File::open(file.path())?)?;
        let addresses = TraceParser::new()?.addresses(reader).collect::<Result<Vec<_>, _>>()?;
        assert_eq!(addresses, [0, 0x400, 0]);

        let empty = tempfile::NamedTempFile::new()?;
        let reader = get_reader(File::open(empty.path())?)?;
        assert_eq!(TraceParser::new()?.addresses(reader).count(), 0);
        Ok(())
    }
}
