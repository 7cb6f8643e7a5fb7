//! # tanzil2sql — Tanzil Quran XML to SQLite scripts
//!
//! Reads the XML text published by [Tanzil](https://tanzil.net/download/),
//! checks that all 6,236 verses are present, adds the Bismillah as verse 0
//! of every surah except Al-Fatiha and at-Tawbah, and renders an SQLite
//! import script.
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use tanzil2sql::prelude::*;
//!
//! let xml = std::fs::read("quran-simple.xml")?;
//! let corpus = tanzil2sql::convert(&xml)?;
//! assert_eq!(corpus.len(), 6348);
//!
//! let sql = corpus.to_sql(&TableSchema::default(), SaveMode::CreateTableInsert);
//! ```
//!
//! ## Pipeline
//!
//! | Stage        | Module         | Output                               |
//! |--------------|----------------|--------------------------------------|
//! | Ingest       | [`parser`]     | 6,236 verses in document order       |
//! | Augment      | [`bismillah`]  | +112 verse-0 entries                 |
//! | Sort         | [`verse`]      | [`Corpus`] in `(surah, aya)` order   |
//! | Render       | [`transpiler`] | SQL text                             |
//! | Orchestrate  | [`session`]    | select → convert → save workflow     |

pub mod bismillah;
pub mod config;
pub mod error;
pub mod parser;
pub mod session;
pub mod transpiler;
pub mod verse;

#[cfg(test)]
pub(crate) mod fixtures;

pub use verse::{Corpus, Verse, EXPECTED_VERSE_COUNT, SURAH_VERSE_COUNTS};

pub mod prelude {
    pub use crate::bismillah::BismillahVariant;
    pub use crate::config::Config;
    pub use crate::error::*;
    pub use crate::session::{Notice, Session, SessionEvents, Status, XmlSource};
    pub use crate::transpiler::{output_file_name, SaveMode, TableSchema, ToSql};
    pub use crate::verse::{Corpus, Verse};
}

/// Parse, validate, augment and sort a Tanzil XML document.
///
/// # Example
///
/// ```
/// let err = tanzil2sql::convert(b"<quran/>").unwrap_err();
/// assert!(err.to_string().contains("0, not 6236"));
/// ```
pub fn convert(input: &[u8]) -> Result<Corpus, error::TanzilError> {
    parser::parse(input).map(Corpus::assemble)
}
