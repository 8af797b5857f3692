//! Quantization levels and their fidelity ordering.
//!
//! Artifact selection never sorts tags lexicographically. Every comparison
//! goes through [`Quantization::ALL`], which lists the supported tags from
//! the highest fidelity (full float) down to the smallest quantized variant.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A precision/size tradeoff tag attached to an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Quantization {
    F32,
    Bf16,
    F16,
    Q8_0,
    Q6K,
    Q5KM,
    Q5KS,
    Q5_0,
    #[default]
    Q4KM,
    Q4KS,
    Q4_0,
    Q3KL,
    Q3KM,
    Q3KS,
    Q2K,
}

impl Quantization {
    /// Every supported tag, highest fidelity first.
    pub const ALL: [Self; 15] = [
        Self::F32,
        Self::Bf16,
        Self::F16,
        Self::Q8_0,
        Self::Q6K,
        Self::Q5KM,
        Self::Q5KS,
        Self::Q5_0,
        Self::Q4KM,
        Self::Q4KS,
        Self::Q4_0,
        Self::Q3KL,
        Self::Q3KM,
        Self::Q3KS,
        Self::Q2K,
    ];

    /// Canonical tag as it appears in artifact filenames.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::F32 => "F32",
            Self::Bf16 => "BF16",
            Self::F16 => "F16",
            Self::Q8_0 => "Q8_0",
            Self::Q6K => "Q6_K",
            Self::Q5KM => "Q5_K_M",
            Self::Q5KS => "Q5_K_S",
            Self::Q5_0 => "Q5_0",
            Self::Q4KM => "Q4_K_M",
            Self::Q4KS => "Q4_K_S",
            Self::Q4_0 => "Q4_0",
            Self::Q3KL => "Q3_K_L",
            Self::Q3KM => "Q3_K_M",
            Self::Q3KS => "Q3_K_S",
            Self::Q2K => "Q2_K",
        }
    }

    /// Position in [`Self::ALL`]; 0 is the highest fidelity.
    pub fn fidelity_rank(self) -> usize {
        Self::ALL
            .iter()
            .position(|q| *q == self)
            .unwrap_or(Self::ALL.len())
    }

    /// Orders by fidelity, higher fidelity first.
    pub fn cmp_fidelity(self, other: Self) -> Ordering {
        self.fidelity_rank().cmp(&other.fidelity_rank())
    }

    /// Float formats are produced by conversion alone and need no quantize pass.
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::Bf16 | Self::F16)
    }

    /// Detect the quantization tag carried by an artifact filename.
    ///
    /// A tag only counts when it sits on token boundaries: the preceding
    /// character must not be alphanumeric and the following one must be
    /// neither alphanumeric nor `_`. This keeps `BF16` from reading as `F16`
    /// and `Q4_K_M` from reading as a shorter tag.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let upper = filename.to_ascii_uppercase();
        let bytes = upper.as_bytes();

        // Longest tags first so overlapping prefixes resolve to the specific one.
        let mut by_len = Self::ALL;
        by_len.sort_by_key(|q| std::cmp::Reverse(q.as_str().len()));

        for quant in by_len {
            let tag = quant.as_str();
            for (start, _) in upper.match_indices(tag) {
                let end = start + tag.len();
                let before_ok = start == 0 || !bytes[start - 1].is_ascii_alphanumeric();
                let after_ok = end == bytes.len()
                    || !(bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_');
                if before_ok && after_ok {
                    return Some(quant);
                }
            }
        }
        None
    }
}

impl fmt::Display for Quantization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a quantization tag is not in the supported set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported quantization '{0}'")]
pub struct UnknownQuantization(pub String);

impl FromStr for Quantization {
    type Err = UnknownQuantization;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|q| q.as_str() == wanted)
            .ok_or_else(|| UnknownQuantization(s.to_string()))
    }
}

impl TryFrom<String> for Quantization {
    type Error = UnknownQuantization;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Quantization> for String {
    fn from(value: Quantization) -> Self {
        value.as_str().to_string()
    }
}
