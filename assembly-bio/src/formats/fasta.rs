use assembly_core::{AssemblyError, AssemblyResult};
use flate2::read::GzDecoder;
use nom::{
    bytes::complete::{tag, take_till},
    character::complete::space0,
    combinator::rest,
    IResult,
};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Line width used when writing sequence data
pub const LINE_WIDTH: usize = 60;

/// One FASTA record as read from disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    pub id: String,
    /// Header text following the id token, trimmed
    pub description: String,
    pub sequence: Vec<u8>,
}

impl FastaRecord {
    pub fn new(id: impl Into<String>, sequence: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            sequence: sequence.into(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn header(&self) -> String {
        if self.description.is_empty() {
            format!(">{}", self.id)
        } else {
            format!(">{} {}", self.id, self.description)
        }
    }
}

/// Parse a FASTA header line (without line terminator) into id and description
fn parse_header(input: &str) -> IResult<&str, (&str, &str)> {
    let (input, _) = tag(">")(input)?;
    let (input, _) = space0(input)?;
    let (input, id) = take_till(|c: char| c.is_whitespace())(input)?;
    let (input, _) = space0(input)?;
    let (input, description) = rest(input)?;
    Ok((input, (id, description.trim_end())))
}

/// Streaming reader yielding one [`FastaRecord`] at a time
pub struct FastaReader<R: BufRead> {
    reader: R,
    source: String,
    line: Vec<u8>,
    line_number: usize,
    pending_header: Option<(String, String)>,
    started: bool,
    finished: bool,
}

impl<R: BufRead> FastaReader<R> {
    /// `source` names the input in error messages
    pub fn new(reader: R, source: impl Into<String>) -> Self {
        Self {
            reader,
            source: source.into(),
            line: Vec::new(),
            line_number: 0,
            pending_header: None,
            started: false,
            finished: false,
        }
    }

    /// Read the next line into the buffer, stripping the terminator. `false` at EOF.
    fn read_line(&mut self) -> AssemblyResult<bool> {
        self.line.clear();
        let read = self.reader.read_until(b'\n', &mut self.line)?;
        if read == 0 {
            return Ok(false);
        }
        self.line_number += 1;
        while matches!(self.line.last(), Some(b'\n') | Some(b'\r')) {
            self.line.pop();
        }
        Ok(true)
    }

    fn header_from_line(&self) -> AssemblyResult<(String, String)> {
        let text = String::from_utf8_lossy(&self.line);
        let (_, (id, description)) = parse_header(&text).map_err(|_| {
            AssemblyError::Parse(format!(
                "Malformed FASTA header at line {} of {}",
                self.line_number, self.source
            ))
        })?;
        if id.is_empty() {
            return Err(AssemblyError::Parse(format!(
                "FASTA header without an identifier at line {} of {}",
                self.line_number, self.source
            )));
        }
        Ok((id.to_string(), description.to_string()))
    }

    /// Skip to the first header, rejecting sequence data that precedes it
    fn find_first_header(&mut self) -> AssemblyResult<()> {
        self.started = true;
        while self.read_line()? {
            if self.line.first() == Some(&b'>') {
                self.pending_header = Some(self.header_from_line()?);
                return Ok(());
            }
            if !self.line.iter().all(|b| b.is_ascii_whitespace()) {
                return Err(AssemblyError::Parse(format!(
                    "Expected a '>' header at line {} of {}",
                    self.line_number, self.source
                )));
            }
        }
        Ok(())
    }

    fn next_record(&mut self) -> AssemblyResult<Option<FastaRecord>> {
        if !self.started {
            self.find_first_header()?;
        }
        let Some((id, description)) = self.pending_header.take() else {
            return Ok(None);
        };

        let mut sequence = Vec::new();
        while self.read_line()? {
            if self.line.first() == Some(&b'>') {
                self.pending_header = Some(self.header_from_line()?);
                break;
            }
            // Trailing whitespace is dropped; inside a line only spaces and CRs are
            let end = self
                .line
                .iter()
                .rposition(|b| !b.is_ascii_whitespace())
                .map_or(0, |i| i + 1);
            sequence.extend(
                self.line[..end]
                    .iter()
                    .copied()
                    .filter(|b| !matches!(b, b' ' | b'\r')),
            );
        }

        Ok(Some(FastaRecord {
            id,
            description,
            sequence,
        }))
    }
}

impl<R: BufRead> Iterator for FastaReader<R> {
    type Item = AssemblyResult<FastaRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Trait for types that can open FASTA files for streaming
pub trait FastaReadable {
    /// Open a FASTA file for reading, transparently decompressing `.gz`
    fn open_for_reading<P: AsRef<Path>>(path: P) -> AssemblyResult<Box<dyn BufRead>> {
        let path = path.as_ref();
        let file = File::open(path)?;

        if path.extension().and_then(|s| s.to_str()) == Some("gz") {
            Ok(Box::new(BufReader::new(GzDecoder::new(file))))
        } else {
            Ok(Box::new(BufReader::new(file)))
        }
    }

    /// Stream the records of a FASTA file
    fn records<P: AsRef<Path>>(path: P) -> AssemblyResult<FastaReader<Box<dyn BufRead>>> {
        let path = path.as_ref();
        let reader = Self::open_for_reading(path)?;
        Ok(FastaReader::new(reader, path.display().to_string()))
    }
}

/// Zero-sized type that implements FastaReadable
pub struct FastaFile;

impl FastaReadable for FastaFile {}

/// Writes records with sequence lines wrapped at [`LINE_WIDTH`]
pub struct FastaWriter<W: Write> {
    writer: W,
}

impl<W: Write> FastaWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write_record(&mut self, record: &FastaRecord) -> AssemblyResult<()> {
        self.writer.write_all(record.header().as_bytes())?;
        self.writer.write_all(b"\n")?;
        for chunk in record.sequence.chunks(LINE_WIDTH) {
            self.writer.write_all(chunk)?;
            self.writer.write_all(b"\n")?;
        }
        Ok(())
    }

    pub fn finish(mut self) -> AssemblyResult<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Write records to a new FASTA file, returning how many were written
pub fn write_fasta<P, I>(path: P, records: I) -> AssemblyResult<usize>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = FastaRecord>,
{
    let file = File::create(path.as_ref())?;
    let mut writer = FastaWriter::new(BufWriter::new(file));
    let mut written = 0;
    for record in records {
        writer.write_record(&record)?;
        written += 1;
    }
    writer.finish()?;
    Ok(written)
}
