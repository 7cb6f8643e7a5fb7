//! Synthetic Tanzil documents for unit tests.

use crate::verse::{Verse, SURAH_VERSE_COUNTS};

/// A document with `counts[i]` verses in surah `i + 1`.
pub(crate) fn flat_xml(counts: &[usize]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"utf-8\" ?>\n<quran>\n");
    for (i, &count) in counts.iter().enumerate() {
        let surah = i + 1;
        xml.push_str(&format!("  <sura index=\"{surah}\">\n"));
        for aya in 1..=count {
            xml.push_str(&format!(
                "    <aya index=\"{aya}\" text=\"verse {surah}:{aya}\"/>\n"
            ));
        }
        xml.push_str("  </sura>\n");
    }
    xml.push_str("</quran>\n");
    xml
}

/// A document shaped like the real text: 114 surahs, 6,236 verses.
pub(crate) fn tanzil_xml() -> String {
    let counts: Vec<usize> = SURAH_VERSE_COUNTS.iter().map(|&n| n as usize).collect();
    flat_xml(&counts)
}

/// The verses of [`tanzil_xml`] in document order.
pub(crate) fn tanzil_verses() -> Vec<Verse> {
    SURAH_VERSE_COUNTS
        .iter()
        .enumerate()
        .flat_map(|(i, &count)| {
            let surah = i as u32 + 1;
            (1..=count as u32).map(move |aya| Verse::new(surah, aya, format!("verse {surah}:{aya}")))
        })
        .collect()
}
