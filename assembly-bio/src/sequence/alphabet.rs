//! Character classes accepted in nucleotide FASTA files

use assembly_core::AssemblyError;

/// IUPAC nucleotide codes plus gap and `X`
pub const NUCLEOTIDE_CHARS: &[u8] = b"-ACGTUWSMKRYBDHVNX";

/// Residues that only occur in protein sequences
pub const AMINO_ACID_ONLY_CHARS: &[u8] = b"PLIFQE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Nucleotide,
    AminoAcid,
    Invalid,
}

/// Classify one upper-cased sequence byte
pub fn classify(byte: u8) -> CharClass {
    if NUCLEOTIDE_CHARS.contains(&byte) {
        CharClass::Nucleotide
    } else if AMINO_ACID_ONLY_CHARS.contains(&byte) {
        CharClass::AminoAcid
    } else {
        CharClass::Invalid
    }
}

/// Reject any byte outside the nucleotide alphabet
pub fn validate_char(byte: u8) -> Result<(), AssemblyError> {
    match classify(byte) {
        CharClass::Nucleotide => Ok(()),
        CharClass::AminoAcid => Err(AssemblyError::Parse(
            "This FASTA file may have amino acids in it instead of the required nucleotides."
                .to_string(),
        )),
        CharClass::Invalid => Err(AssemblyError::Parse(format!(
            "This FASTA file has non nucleic acid characters: {}",
            char::from(byte)
        ))),
    }
}
