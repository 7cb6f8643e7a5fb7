//! Verse model and the assembled corpus.

use serde::Serialize;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use crate::bismillah;

/// Total number of genuine verses in a complete Tanzil text.
pub const EXPECTED_VERSE_COUNT: usize = 6236;

/// Number of surahs in the Quran.
pub const SURAH_COUNT: u32 = 114;

/// Verses per surah in the Tanzil text, indexed by `surah - 1`.
pub const SURAH_VERSE_COUNTS: [u16; 114] = [
    7, 286, 200, 176, 120, 165, 206, 75, 129, 109, 123, 111, 43, 52, 99, 128, 111, 110, 98, 135,
    112, 78, 118, 64, 77, 227, 93, 88, 69, 60, 34, 30, 73, 54, 45, 83, 182, 88, 75, 85, 54, 53,
    89, 59, 37, 35, 38, 29, 18, 45, 60, 49, 62, 55, 78, 96, 29, 22, 24, 13, 14, 11, 11, 18, 12,
    12, 30, 52, 52, 44, 28, 28, 20, 56, 40, 31, 50, 40, 46, 42, 29, 19, 36, 25, 22, 17, 19, 26,
    30, 20, 15, 21, 11, 8, 8, 19, 5, 8, 8, 11, 11, 8, 3, 9, 5, 4, 7, 3, 6, 3, 5, 4, 5, 6,
];

/// A single verse. `aya == 0` marks a synthetic Bismillah.
///
/// Equality, hashing and ordering only look at `(surah, aya)`.
#[derive(Debug, Clone, Serialize)]
pub struct Verse {
    pub surah: u32,
    pub aya: u32,
    pub text: String,
}

impl Verse {
    pub fn new(surah: u32, aya: u32, text: impl Into<String>) -> Self {
        Self {
            surah,
            aya,
            text: text.into(),
        }
    }

    /// The composite identity, also used as the sort key.
    pub fn id(&self) -> (u32, u32) {
        (self.surah, self.aya)
    }

    pub fn is_bismillah(&self) -> bool {
        self.aya == 0
    }
}

impl PartialEq for Verse {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Verse {}

impl Hash for Verse {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl PartialOrd for Verse {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Verse {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id().cmp(&other.id())
    }
}

impl std::fmt::Display for Verse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {} - {}", self.surah, self.aya, self.text)
    }
}

/// Sort verses into canonical `(surah, aya)` order.
pub fn sort_verses(verses: &mut [Verse]) {
    verses.sort_by_key(Verse::id);
}

/// Whether every adjacent pair is in canonical order.
pub fn is_sorted(verses: &[Verse]) -> bool {
    verses.windows(2).all(|w| w[0].id() <= w[1].id())
}

/// The validated, augmented and sorted verse collection.
#[derive(Debug, Clone)]
pub struct Corpus {
    verses: Vec<Verse>,
    raw_count: usize,
}

impl Corpus {
    /// Build the final collection from ingested verses: add the Bismillah
    /// entries, then sort.
    pub fn assemble(raw: Vec<Verse>) -> Self {
        let raw_count = raw.len();
        let mut verses = bismillah::augment(raw);
        sort_verses(&mut verses);
        tracing::debug!(
            "Assembled corpus: {} ingested, {} total",
            raw_count,
            verses.len()
        );
        Self { verses, raw_count }
    }

    pub fn verses(&self) -> &[Verse] {
        &self.verses
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Verse> {
        self.verses.iter()
    }

    pub fn len(&self) -> usize {
        self.verses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verses.is_empty()
    }

    /// Verses as ingested, before augmentation.
    pub fn raw_count(&self) -> usize {
        self.raw_count
    }

    pub fn bismillah_count(&self) -> usize {
        self.verses.iter().filter(|v| v.is_bismillah()).count()
    }

    /// Genuine verse counts per surah, compared with the reference table.
    pub fn surah_summary(&self) -> Vec<SurahSummary> {
        let mut found = [0usize; SURAH_COUNT as usize];
        let mut stray = 0usize;
        for verse in self.verses.iter().filter(|v| !v.is_bismillah()) {
            match verse.surah.checked_sub(1).map(|i| i as usize) {
                Some(i) if i < found.len() => found[i] += 1,
                _ => stray += 1,
            }
        }
        if stray > 0 {
            tracing::warn!("{} verses fall outside surahs 1..={}", stray, SURAH_COUNT);
        }

        found
            .iter()
            .zip(SURAH_VERSE_COUNTS.iter())
            .enumerate()
            .map(|(i, (&count, &expected))| SurahSummary {
                surah: i as u32 + 1,
                expected: expected as usize,
                found: count,
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a Verse;
    type IntoIter = std::slice::Iter<'a, Verse>;

    fn into_iter(self) -> Self::IntoIter {
        self.verses.iter()
    }
}

/// Verse count of one surah against the reference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SurahSummary {
    pub surah: u32,
    pub expected: usize,
    pub found: usize,
}

impl SurahSummary {
    pub fn matches(&self) -> bool {
        self.expected == self.found
    }
}
