use crate::errors::Error;

/// Canonical amino alphabet, in digital encoding order.
pub const AMINO_ALPHABET: [u8; 20] = *b"ACDEFGHIKLMNPQRSTVWY";
pub const AMINO_COUNT: usize = 20;

/// Digital codes for the non-canonical symbols.
pub const RESIDUE_X: u8 = 20;
pub const RESIDUE_GAP: u8 = 21;
pub const RESIDUE_NON: u8 = 22;
pub const RESIDUE_MISSING: u8 = 23;

/// Alphabet size including wildcard, gap, non-residue and missing codes.
pub const ALPHABET_WITH_SPECIALS: usize = 24;

fn digitize(byte: u8, strict: bool) -> Result<u8, Error> {
    let upper = byte.to_ascii_uppercase();
    match upper {
        b'-' | b'.' => return Ok(RESIDUE_GAP),
        b'*' => return Ok(RESIDUE_NON),
        b'~' => return Ok(RESIDUE_MISSING),
        b'X' => return Ok(RESIDUE_X),
        _ => {}
    }

    if let Some(code) = AMINO_ALPHABET.iter().position(|&a| a == upper) {
        return Ok(code as u8);
    }

    // degenerate codes collapse to the wildcard unless strict digitization
    // was requested
    if !strict && upper.is_ascii_alphabetic() {
        return Ok(RESIDUE_X);
    }

    Err(Error::InvalidSequence {
        reason: format!("unrecognized residue character: {:?}", byte as char),
    })
}

/// Turn a digital code back into its display character.
pub fn residue_char(code: u8) -> char {
    match code {
        RESIDUE_X => 'X',
        RESIDUE_GAP => '-',
        RESIDUE_NON => '*',
        RESIDUE_MISSING => '~',
        code if (code as usize) < AMINO_COUNT => AMINO_ALPHABET[code as usize] as char,
        _ => '?',
    }
}

/// A digitized amino sequence with an optional active sub-range.
///
/// The engine only ever sees the active range; setting a range never copies
/// the underlying residues.
#[derive(Clone, Debug, Default)]
pub struct Sequence {
    pub name: String,
    digital: Vec<u8>,
    range_start: usize,
    range_end: usize,
}

impl Sequence {
    pub fn from_utf8(name: &str, bytes: &[u8]) -> Result<Self, Error> {
        Self::digitized(name, bytes, false)
    }

    /// Like [`Sequence::from_utf8`], but rejects degenerate residue codes
    /// instead of collapsing them to the wildcard.
    pub fn from_utf8_strict(name: &str, bytes: &[u8]) -> Result<Self, Error> {
        Self::digitized(name, bytes, true)
    }

    fn digitized(name: &str, bytes: &[u8], strict: bool) -> Result<Self, Error> {
        if bytes.is_empty() {
            return Err(Error::InvalidSequence {
                reason: "empty sequence".to_string(),
            });
        }

        let digital = bytes
            .iter()
            .map(|&b| digitize(b, strict))
            .collect::<Result<Vec<u8>, Error>>()?;

        let range_end = digital.len();
        Ok(Self {
            name: name.to_string(),
            digital,
            range_start: 0,
            range_end,
        })
    }

    /// Restrict the active range to `[start, end)` of the full sequence.
    pub fn set_range(&mut self, start: usize, end: usize) -> Result<(), Error> {
        if end <= start || end > self.digital.len() {
            return Err(Error::InvalidSequence {
                reason: format!(
                    "range [{start}, {end}) invalid for sequence of length {}",
                    self.digital.len()
                ),
            });
        }
        self.range_start = start;
        self.range_end = end;
        Ok(())
    }

    pub fn clear_range(&mut self) {
        self.range_start = 0;
        self.range_end = self.digital.len();
    }

    /// Length of the active range.
    pub fn length(&self) -> usize {
        self.range_end - self.range_start
    }

    /// Digital code at position `idx` of the active range.
    #[inline]
    pub fn digital(&self, idx: usize) -> u8 {
        self.digital[self.range_start + idx]
    }

    pub fn residues(&self) -> &[u8] {
        &self.digital[self.range_start..self.range_end]
    }

    pub fn to_string(&self) -> String {
        self.residues().iter().map(|&c| residue_char(c)).collect()
    }
}
