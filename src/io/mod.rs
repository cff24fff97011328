use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use anyhow::bail;
use bio::io::fasta::{Reader, Record};
use log::info;

use crate::substitution_models::{RateMatrix, N_EXCHANGEABILITIES};
use crate::{alphabets, InputError, Result};

/// Reads sequences from a fasta file, returning a vector of fasta records.
/// All sequences are converted to uppercase. A path of `-` reads from stdin.
///
/// # Arguments
/// * `path` - Path to the fasta file.
///
/// # Example
/// ```
/// use modelmatcher::io::read_sequences;
/// use std::path::PathBuf;
/// let records = read_sequences(&PathBuf::from("./data/sequences_protein_small.fasta")).unwrap();
/// # assert_eq!(records.len(), 4);
/// ```
pub fn read_sequences(path: &Path) -> Result<Vec<Record>> {
    if path == Path::new("-") {
        info!("Reading sequences from stdin");
        return read_sequences_from_reader(io::stdin());
    }
    info!("Reading sequences from file {}", path.display());
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => bail!(InputError::new(format!(
            "Cannot open {}: {}",
            path.display(),
            e
        ))),
    };
    read_sequences_from_reader(file)
}

/// Reads fasta records from any reader. Bails if no records are found or a record is malformed.
pub fn read_sequences_from_reader<R: Read>(reader: R) -> Result<Vec<Record>> {
    let reader = Reader::new(reader);
    let mut sequences = Vec::new();
    for result in reader.records() {
        let rec = match result {
            Ok(rec) => rec,
            Err(e) => bail!(InputError::new(e.to_string())),
        };
        if let Err(e) = rec.check() {
            bail!(InputError::new(e.to_string()));
        }
        sequences.push(Record::with_attrs(
            rec.id(),
            rec.desc(),
            &rec.seq().to_ascii_uppercase(),
        ));
    }
    if sequences.is_empty() {
        bail!(InputError::new("No sequences found in input"));
    }
    info!("Read {} sequences successfully", sequences.len());
    Ok(sequences)
}

/// Reads an amino acid replacement model in PAML format (as also used by PhyML).
///
/// Lines starting with `#` are skipped. Values are collected as exchangeabilities, lower
/// triangle row by row, until the first line holding at least 20 numbers, which is taken as
/// the frequency vector. Anything after the frequencies is ignored.
pub fn read_paml_model(path: &Path, name: &str) -> Result<RateMatrix> {
    info!("Reading model {} from file {}", name, path.display());
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => bail!(InputError::new(format!(
            "Cannot open model file {}: {}",
            path.display(),
            e
        ))),
    };
    parse_paml_model(BufReader::new(file), name)
}

/// Reads every `.dat` and `.paml` file of a directory as a PAML model named after its file
/// stem, in file name order. This loads model collections such as the `dat/` directory of a
/// PAML installation.
/// Bails if the directory cannot be read, holds no model file, or any model file is malformed.
pub fn read_model_dir(dir: &Path) -> Result<Vec<RateMatrix>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => bail!(InputError::new(format!(
            "Cannot read model directory {}: {}",
            dir.display(),
            e
        ))),
    };
    let mut paths = entries
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.is_file() && is_model_file(path))
        .collect::<Vec<_>>();
    if paths.is_empty() {
        bail!(InputError::new(format!(
            "No model files (.dat, .paml) found in {}",
            dir.display()
        )));
    }
    paths.sort();
    info!("Reading {} models from {}", paths.len(), dir.display());
    paths
        .iter()
        .map(|path| {
            let name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            read_paml_model(path, &name)
        })
        .collect()
}

fn is_model_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("dat") || ext.eq_ignore_ascii_case("paml"))
        .unwrap_or(false)
}

pub fn parse_paml_model<R: BufRead>(reader: R, name: &str) -> Result<RateMatrix> {
    let mut exchangeabilities = Vec::with_capacity(N_EXCHANGEABILITIES);
    let mut freqs = None;
    for line in reader.lines() {
        let line = line?;
        if line.starts_with('#') {
            continue;
        }
        let values = parse_values(&line)?;
        if values.len() < alphabets::N {
            exchangeabilities.extend(values);
        } else {
            freqs = Some(values);
            break;
        }
    }
    let Some(freqs) = freqs else {
        bail!(InputError::new(
            "Is the input really a PAML-formatted model? No frequency line found."
        ));
    };
    if exchangeabilities.len() != N_EXCHANGEABILITIES {
        bail!(InputError::new(format!(
            "Expected {} exchangeabilities in model {}, found {}",
            N_EXCHANGEABILITIES,
            name,
            exchangeabilities.len()
        )));
    }
    if freqs.len() != alphabets::N {
        bail!(InputError::new(format!(
            "Expected {} frequencies in model {}, found {}",
            alphabets::N,
            name,
            freqs.len()
        )));
    }
    RateMatrix::new(name, &exchangeabilities, &freqs)
}

fn parse_values(line: &str) -> Result<Vec<f64>> {
    line.split_whitespace()
        .map(|token| -> Result<f64> {
            match token.parse::<f64>() {
                Ok(value) => Ok(value),
                Err(_) => bail!(InputError::new(format!(
                    "Invalid number in model file: '{}'",
                    token
                ))),
            }
        })
        .collect()
}
