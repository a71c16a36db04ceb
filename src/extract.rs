//! Record extraction: file bytes to ingestion records
//!
//! The extractor wraps a [`RecordParser`] and turns one file into zero or
//! more [`IngestionRecord`]s, one per game tree. Failures are data: a read
//! or parse failure yields a single errored record for the file, and a field
//! lookup failure errors only the record of the game tree it came from.

use crate::error::{ExtractError, GameField};
use crate::sgf::FuzzyDate;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Network label used when nothing more specific is known
pub const DEFAULT_NETWORK: &str = "sample";

/// A parser that splits raw file bytes into game trees
pub trait RecordParser: Send + Sync {
    /// One game tree of a parsed collection
    type Tree: GameTreeInfo;

    /// Whole-file parse failure
    type Error: fmt::Display;

    fn parse(&self, data: &[u8]) -> Result<Vec<Self::Tree>, Self::Error>;
}

/// Metadata accessors on a parsed game tree
///
/// Each lookup can fail independently of the others.
pub trait GameTreeInfo {
    type Error: fmt::Display;

    fn start_date(&self) -> Result<FuzzyDate, Self::Error>;

    fn black_player_name(&self) -> Result<String, Self::Error>;

    fn white_player_name(&self) -> Result<String, Self::Error>;

    /// `"B"`, `"W"`, or any other value meaning no winner
    fn winner_color(&self) -> Result<String, Self::Error>;
}

/// Which side won a game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WinnerColor {
    Black,
    White,
    NoWinner,
}

impl WinnerColor {
    /// Map a parser's winner tag; an empty tag is not a valid value
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "" => None,
            "B" => Some(WinnerColor::Black),
            "W" => Some(WinnerColor::White),
            _ => Some(WinnerColor::NoWinner),
        }
    }
}

/// Game metadata of a successfully extracted record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameInfo {
    pub black: String,
    pub white: String,
    pub network: String,
    pub winner: WinnerColor,
    pub date: FuzzyDate,
}

/// One parsed game occurrence
#[derive(Debug, Clone)]
pub struct IngestionRecord {
    /// Source file, shared by every record of the same file
    pub path: Arc<Path>,

    /// Extracted metadata, or the reason this record is unusable
    pub game: Result<GameInfo, ExtractError>,
}

impl IngestionRecord {
    fn failed(path: Arc<Path>, error: ExtractError) -> Self {
        Self {
            path,
            game: Err(error),
        }
    }

    /// The error carried by this record, if any
    pub fn error(&self) -> Option<&ExtractError> {
        self.game.as_ref().err()
    }
}

/// Records produced from one file
#[derive(Debug)]
pub struct FileExtraction {
    pub records: Vec<IngestionRecord>,
    pub bytes_read: u64,
}

/// Converts files into ingestion records using a [`RecordParser`]
#[derive(Debug, Clone)]
pub struct RecordExtractor<P> {
    parser: P,
    network: String,
}

impl<P: RecordParser> RecordExtractor<P> {
    pub fn new(parser: P, network: impl Into<String>) -> Self {
        Self {
            parser,
            network: network.into(),
        }
    }

    /// Read and extract a single file
    pub fn extract_file(&self, path: &Path) -> FileExtraction {
        let shared: Arc<Path> = Arc::from(path);

        match std::fs::read(path) {
            Ok(data) => FileExtraction {
                bytes_read: data.len() as u64,
                records: self.extract_bytes(shared, &data),
            },
            Err(e) => FileExtraction {
                bytes_read: 0,
                records: vec![IngestionRecord::failed(
                    shared,
                    ExtractError::Read(e.to_string()),
                )],
            },
        }
    }

    /// Extract records from already-read file contents
    pub fn extract_bytes(&self, path: Arc<Path>, data: &[u8]) -> Vec<IngestionRecord> {
        let trees = match self.parser.parse(data) {
            Ok(trees) => trees,
            Err(e) => {
                return vec![IngestionRecord::failed(
                    path,
                    ExtractError::Parse(e.to_string()),
                )]
            }
        };

        trees
            .iter()
            .map(|tree| IngestionRecord {
                path: Arc::clone(&path),
                game: self.extract_tree(tree),
            })
            .collect()
    }

    fn extract_tree(&self, tree: &P::Tree) -> Result<GameInfo, ExtractError> {
        let field_err = |field: GameField| {
            move |e: <P::Tree as GameTreeInfo>::Error| ExtractError::Field {
                field,
                reason: e.to_string(),
            }
        };

        let date = tree.start_date().map_err(field_err(GameField::Date))?;
        let black = tree
            .black_player_name()
            .map_err(field_err(GameField::BlackPlayer))?;
        let white = tree
            .white_player_name()
            .map_err(field_err(GameField::WhitePlayer))?;
        let tag = tree
            .winner_color()
            .map_err(field_err(GameField::WinnerColor))?;
        let winner = WinnerColor::from_tag(&tag).ok_or(ExtractError::EmptyWinnerColor)?;

        Ok(GameInfo {
            black,
            white,
            network: self.network.clone(),
            winner,
            date,
        })
    }
}
