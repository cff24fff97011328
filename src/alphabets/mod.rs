use lazy_static::lazy_static;

pub static AMINOACIDS: &[u8] = b"ARNDCQEGHILKMFPSTWYV";
pub static GAP: u8 = b'-';
pub static POSSIBLE_GAPS: &[u8] = b"-.~";

/// Number of amino acid states.
pub const N: usize = 20;

/// Per-position amino acid codes of one aligned sequence, `None` where the residue is undefined.
pub type EncodedSequence = Vec<Option<usize>>;

lazy_static! {
    pub static ref AMINOACID_INDEX: [Option<usize>; 256] = {
        let mut index = [None; 256];
        for (i, &char) in AMINOACIDS.iter().enumerate() {
            index[char as usize] = Some(i);
            index[char.to_ascii_lowercase() as usize] = Some(i);
        }
        index
    };
}

/// Returns the code of an amino acid character, or `None` for gaps, ambiguity codes and
/// anything else outside of the 20 standard residues.
pub fn aminoacid_code(char: u8) -> Option<usize> {
    AMINOACID_INDEX[char as usize]
}

/// Encodes an aligned sequence into amino acid codes.
///
/// The mapping is permissive: gaps and unrecognised characters both become `None`, nothing is
/// rejected.
///
/// # Example
/// ```
/// use modelmatcher::alphabets::encode_sequence;
/// let encoded = encode_sequence(b"AR-x");
/// assert_eq!(encoded, vec![Some(0), Some(1), None, None]);
/// ```
pub fn encode_sequence(seq: &[u8]) -> EncodedSequence {
    seq.iter().map(|&c| aminoacid_code(c)).collect()
}

/// Returns the amino acid character for a code.
pub fn aminoacid(code: usize) -> char {
    AMINOACIDS[code] as char
}
