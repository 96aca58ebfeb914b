//! Input-to-output path mapping.
//!
//! A transcript mirrors its media file: same path relative to the input
//! root, rooted at the output root, extension swapped for `.txt`.

use std::path::{Path, PathBuf, StripPrefixError};

/// Extension given to every transcript file.
pub const TRANSCRIPT_EXT: &str = "txt";

/// A media file paired with its derived transcript path.
///
/// Built per scan entry or watch event and discarded after processing.
/// The input path is its only identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaTask {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl MediaTask {
    /// Pair `input` with its transcript path under `output_root`.
    ///
    /// `input` must lie under `input_root`; both entry points guarantee this
    /// by construction, since every path originates from a walk or watch
    /// rooted there.
    pub fn resolve(
        input: &Path,
        input_root: &Path,
        output_root: &Path,
    ) -> Result<Self, StripPrefixError> {
        let output = transcript_path(input, input_root, output_root)?;
        Ok(Self {
            input: input.to_path_buf(),
            output,
        })
    }
}

/// Map a media path to its transcript path.
///
/// Preserves every intermediate directory segment and replaces the final
/// component's extension with `.txt` (appending it when there is none).
/// Pure and deterministic; no filesystem access.
pub fn transcript_path(
    input: &Path,
    input_root: &Path,
    output_root: &Path,
) -> Result<PathBuf, StripPrefixError> {
    let relative = input.strip_prefix(input_root)?;
    let mut output = output_root.join(relative);
    output.set_extension(TRANSCRIPT_EXT);
    Ok(output)
}
