use anyhow::bail;
use bio::io::fasta::Record;
use log::{debug, info};

use crate::alphabets::{encode_sequence, EncodedSequence};
use crate::InputError;
use crate::Result;

/// An aligned set of named protein sequences, encoded once on construction.
#[derive(Clone, Debug, PartialEq)]
pub struct Alignment {
    ids: Vec<String>,
    sequences: Vec<EncodedSequence>,
    len: usize,
}

impl Alignment {
    /// Encodes the given records into an alignment.
    /// Bails if there are fewer than two sequences, if the sequences are empty, or if they are
    /// not all of the same length.
    ///
    /// # Example
    /// ```
    /// use bio::io::fasta::Record;
    /// use modelmatcher::alignment::Alignment;
    /// let msa = Alignment::from_records(vec![
    ///     Record::with_attrs("a", None, b"ARN-"),
    ///     Record::with_attrs("b", None, b"ARDV"),
    /// ])
    /// .unwrap();
    /// assert_eq!(msa.seq_count(), 2);
    /// assert_eq!(msa.len(), 4);
    /// ```
    pub fn from_records(records: Vec<Record>) -> Result<Alignment> {
        if records.len() < 2 {
            bail!(InputError::new(format!(
                "At least two sequences are required, found {}",
                records.len()
            )));
        }
        let len = records[0].seq().len();
        if len == 0 {
            bail!(InputError::new("Sequences are empty"));
        }
        if let Some(rec) = records.iter().find(|rec| rec.seq().len() != len) {
            bail!(InputError::new(format!(
                "Sequences are not aligned: {} has length {}, expected {}",
                rec.id(),
                rec.seq().len(),
                len
            )));
        }
        info!(
            "Encoding alignment of {} sequences of length {}",
            records.len(),
            len
        );
        let (ids, sequences) = records
            .iter()
            .map(|rec| (rec.id().to_string(), encode_sequence(rec.seq())))
            .unzip();
        let msa = Alignment {
            ids,
            sequences,
            len,
        };
        debug!("Alignment has {} defined residues", msa.residue_count());
        Ok(msa)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn sequences(&self) -> &[EncodedSequence] {
        &self.sequences
    }

    pub fn seq_count(&self) -> usize {
        self.sequences.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of positions holding one of the 20 standard amino acids.
    pub fn residue_count(&self) -> usize {
        self.sequences
            .iter()
            .map(|seq| seq.iter().filter(|code| code.is_some()).count())
            .sum()
    }
}
