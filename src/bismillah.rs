//! Bismillah variants and the verse-0 augmentation pass.

use crate::verse::{Verse, SURAH_COUNT};

/// Surah without a Bismillah (at-Tawbah).
pub const TAWBAH: u32 = 9;

/// Number of verses [`augment`] adds.
pub const BISMILLAH_VERSE_COUNT: usize = 112;

/// The textual forms of the Bismillah published by Tanzil.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BismillahVariant {
    Simple,
    SimpleClean,
    SimpleMin,
    SimplePlain,
    UthmaniMin,
    Uthmani,
}

impl BismillahVariant {
    pub const ALL: [BismillahVariant; 6] = [
        BismillahVariant::Simple,
        BismillahVariant::SimpleClean,
        BismillahVariant::SimpleMin,
        BismillahVariant::SimplePlain,
        BismillahVariant::UthmaniMin,
        BismillahVariant::Uthmani,
    ];

    pub fn text(self) -> &'static str {
        match self {
            BismillahVariant::Simple => "بِسْمِ اللَّهِ الرَّحْمَـٰنِ الرَّحِيمِ",
            BismillahVariant::SimpleClean => "بسم الله الرحمن الرحيم",
            BismillahVariant::SimpleMin => "بِسمِ اللَّهِ الرَّحمـٰنِ الرَّحيمِ",
            BismillahVariant::SimplePlain => "بِسْمِ اللَّهِ الرَّحْمَـٰنِ الرَّحِيمِ",
            BismillahVariant::UthmaniMin => "بِسمِ اللَّهِ الرَّحمـٰنِ الرَّحيمِ",
            BismillahVariant::Uthmani => "بِسْمِ ٱللَّهِ ٱلرَّحْمَـٰنِ ٱلرَّحِيمِ",
        }
    }

    /// Name of the matching Tanzil text type.
    pub fn name(self) -> &'static str {
        match self {
            BismillahVariant::Simple => "simple",
            BismillahVariant::SimpleClean => "simple-clean",
            BismillahVariant::SimpleMin => "simple-min",
            BismillahVariant::SimplePlain => "simple-plain",
            BismillahVariant::UthmaniMin => "uthmani-min",
            BismillahVariant::Uthmani => "uthmani",
        }
    }
}

impl std::fmt::Display for BismillahVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Surahs that open with a Bismillah verse 0: 2..=114 without 9.
///
/// Al-Fatiha is skipped because its Bismillah is already verse 1.
pub fn bismillah_surahs() -> impl Iterator<Item = u32> {
    (2..=SURAH_COUNT).filter(|&surah| surah != TAWBAH)
}

/// Append a synthetic verse 0 carrying the simple Bismillah to every surah
/// in [`bismillah_surahs`].
pub fn augment(mut verses: Vec<Verse>) -> Vec<Verse> {
    let text = BismillahVariant::Simple.text();
    verses.reserve(BISMILLAH_VERSE_COUNT);
    verses.extend(bismillah_surahs().map(|surah| Verse::new(surah, 0, text)));
    verses
}
