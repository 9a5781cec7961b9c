//! Format detection and player construction.

use ayplay_common::ChiptunePlayer;
use ayplay_pt3::Pt3Player;
use ayplay_ym::YmPlayer;
use thiserror::Error;

/// Errors surfaced by the CLI player layer.
#[derive(Error, Debug)]
pub enum PlayerError {
    /// The file matches no supported format.
    #[error("unrecognised module format (expected YM or PT3)")]
    UnknownFormat,

    /// The audio device could not be opened.
    #[error("audio output unavailable: {0}")]
    AudioUnavailable(String),

    /// Parse failure in a YM file.
    #[error(transparent)]
    Ym(#[from] ayplay_ym::YmError),

    /// Parse failure in a PT3 module.
    #[error(transparent)]
    Pt3(#[from] ayplay_pt3::Pt3Error),

    /// Filesystem error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// WAV export failure.
    #[error("WAV export failed: {0}")]
    Export(String),
}

/// Supported module formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// YM register stream.
    Ym,
    /// ProTracker 3 module.
    Pt3,
}

/// Detect the format of a file from its content.
pub fn detect(data: &[u8]) -> Option<FileKind> {
    if ayplay_ym::parser::is_ym_format(data) {
        Some(FileKind::Ym)
    } else if ayplay_pt3::parser::is_pt3_format(data) {
        Some(FileKind::Pt3)
    } else {
        None
    }
}

/// Build a player for the file's format.
pub fn create_player(
    data: &[u8],
    sample_rate: u32,
) -> Result<Box<dyn ChiptunePlayer>, PlayerError> {
    match detect(data) {
        Some(FileKind::Ym) => Ok(Box::new(YmPlayer::load_with_rate(data, sample_rate)?)),
        Some(FileKind::Pt3) => Ok(Box::new(Pt3Player::load_with_rate(data, sample_rate)?)),
        None => Err(PlayerError::UnknownFormat),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_ym_magic() {
        let mut data = Vec::new();
        data.extend_from_slice(b"YM3!");
        data.extend_from_slice(&[0u8; 14]);
        assert_eq!(detect(&data), Some(FileKind::Ym));
    }

    #[test]
    fn detects_pt3_header() {
        let mut data = vec![0u8; 400];
        data[..13].copy_from_slice(b"ProTracker 3.");
        assert_eq!(detect(&data), Some(FileKind::Pt3));
    }

    #[test]
    fn unknown_data_is_rejected() {
        assert_eq!(detect(&[0u8; 400]), None);
        assert!(matches!(
            create_player(&[0u8; 400], 44_100),
            Err(PlayerError::UnknownFormat)
        ));
    }

    #[test]
    fn creates_a_ym_player() {
        let mut data = Vec::new();
        data.extend_from_slice(b"YM3!");
        data.extend_from_slice(&[0u8; 14 * 4]);
        let player = create_player(&data, 48_000).unwrap();
        assert_eq!(player.frame_count(), 4);
        assert_eq!(player.sample_rate(), 48_000);
    }
}
