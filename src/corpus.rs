//! Corpus readers producing [`PairExample`]s.
//!
//! The on-disk encoding of a corpus is not part of the encoding contract;
//! anything that can produce a sequence of examples works. [`TsvCorpus`]
//! covers the common case of one tab-separated example per line:
//!
//! ```text
//! text_1 <TAB> start_1 <TAB> end_1 <TAB> text_2 <TAB> start_2 <TAB> end_2 <TAB> label [<TAB> score]
//! ```

use std::fs;
use std::path::Path;

use crate::example::{PairExample, PairLabel};
use crate::{Error, Result};

/// Source of span-pair examples.
pub trait CorpusReader {
    /// Read all examples from `source`.
    fn get_examples(&self, source: &Path) -> Result<Vec<PairExample>>;
}

/// Tab-separated corpus reader. Lines that are empty or start with `#` are
/// skipped; the example id is the 1-based line number.
#[derive(Debug, Clone, Copy, Default)]
pub struct TsvCorpus;

impl TsvCorpus {
    fn parse_line(line: &str, line_no: usize) -> Result<PairExample> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 7 && fields.len() != 8 {
            return Err(Error::dataset(format!(
                "line {line_no}: expected 7 or 8 tab-separated fields, got {}",
                fields.len()
            )));
        }

        let offset = |s: &str, name: &str| -> Result<usize> {
            s.trim().parse::<usize>().map_err(|_| {
                Error::dataset(format!("line {line_no}: invalid {name} offset '{s}'"))
            })
        };

        let label: PairLabel = fields[6].trim().parse()?;
        let score = match fields.get(7) {
            Some(s) => Some(s.trim().parse::<f32>().map_err(|_| {
                Error::dataset(format!("line {line_no}: invalid score '{s}'"))
            })?),
            None => None,
        };

        let mut example = PairExample::new(
            fields[0],
            (offset(fields[1], "start_1")?, offset(fields[2], "end_1")?),
            fields[3],
            (offset(fields[4], "start_2")?, offset(fields[5], "end_2")?),
            label,
        )
        .with_id(line_no.to_string());
        example.score = score;
        Ok(example)
    }
}

impl CorpusReader for TsvCorpus {
    fn get_examples(&self, source: &Path) -> Result<Vec<PairExample>> {
        let content = fs::read_to_string(source)?;
        let mut examples = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            examples.push(Self::parse_line(line, idx + 1)?);
        }
        log::debug!(
            "loaded {} examples from {}",
            examples.len(),
            source.display()
        );
        Ok(examples)
    }
}
