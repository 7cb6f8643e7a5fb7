//! SQL generator for the assembled corpus.
//!
//! Renders SQLite import scripts in one of two shapes:
//!
//! - [`SaveMode::CreateTableInsert`]: `CREATE TABLE` followed by one
//!   multi-row `INSERT INTO` per surah.
//! - [`SaveMode::AddColumnUpdateExistingTable`]: `ALTER TABLE ... ADD COLUMN`
//!   followed by one `UPDATE` per verse.
//!
//! Identifiers from [`TableSchema`] are placed inside backticks verbatim.

use std::borrow::Cow;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TanzilError;
use crate::verse::{Corpus, Verse};

/// Attribution block required by the Tanzil license. Must not be altered.
pub const TANZIL_NOTICE: &str = r#"--====================================================================
-- Note: This .sql file is converted from .xml files of Tanzil.net
-- In the process of conversion Bismillah is added in the beginning
-- of each Surah with aya_number 0 (except for Al-Fatiha and at-Tawbah)
--====================================================================

--====================================================================
-- PLEASE DO NOT REMOVE OR CHANGE THIS COPYRIGHT BLOCK
--====================================================================
--
--  Tanzil Quran Text (Simple, Version 1.1)
--  Copyright (C) 2007-2023 Tanzil Project
--  License: Creative Commons Attribution 3.0
--
--  This copy of the Quran text is carefully produced, highly
--  verified and continuously monitored by a group of specialists
--  at Tanzil Project.
--
--  TERMS OF USE:
--
--  - Permission is granted to copy and distribute verbatim copies
--    of this text, but CHANGING IT IS NOT ALLOWED.
--
--  - This Quran text can be used in any website or application,
--    provided that its source (Tanzil Project) is clearly indicated,
--    and a link is made to tanzil.net to enable users to keep
--    track of changes.
--
--  - This copyright notice shall be included in all verbatim copies
--    of the text, and shall be reproduced appropriately in all files
--    derived from or containing substantial portion of this text.
--
--  Please check updates at: http://tanzil.net/updates/
--
--====================================================================
"#;

const PRAGMA_ENCODING: &str = "PRAGMA encoding=\"UTF-8\";";

/// Which script to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SaveMode {
    /// Create the table and insert every verse.
    CreateTableInsert,
    /// Add a text column to an existing table and fill it with updates.
    AddColumnUpdateExistingTable,
}

impl SaveMode {
    pub const ALL: [SaveMode; 2] = [
        SaveMode::CreateTableInsert,
        SaveMode::AddColumnUpdateExistingTable,
    ];

    /// Tag used in output file names.
    pub fn tag(self) -> &'static str {
        match self {
            SaveMode::CreateTableInsert => "createTableInsert",
            SaveMode::AddColumnUpdateExistingTable => "addColumnUpdateExistingTable",
        }
    }
}

impl std::fmt::Display for SaveMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for SaveMode {
    type Err = TanzilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createTableInsert" | "create-table-insert" | "insert" => Ok(SaveMode::CreateTableInsert),
            "addColumnUpdateExistingTable" | "add-column-update" | "update" => {
                Ok(SaveMode::AddColumnUpdateExistingTable)
            }
            other => Err(TanzilError::Config(format!(
                "Unknown save mode '{}'. Expected: createTableInsert or addColumnUpdateExistingTable",
                other
            ))),
        }
    }
}

/// Target table and column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSchema {
    pub table: String,
    pub surah_column: String,
    pub aya_column: String,
    pub text_column: String,
}

impl Default for TableSchema {
    fn default() -> Self {
        Self {
            table: "ayaDBTable".to_string(),
            surah_column: "surah_number".to_string(),
            aya_column: "aya_number".to_string(),
            text_column: "text".to_string(),
        }
    }
}

/// Name of the generated file: `<table>-<modeTag>-sqlite.sql`.
pub fn output_file_name(schema: &TableSchema, mode: SaveMode) -> String {
    format!("{}-{}-sqlite.sql", schema.table, mode.tag())
}

/// Trait for rendering verses as a SQLite import script.
pub trait ToSql {
    /// Render the whole script as one string.
    fn to_sql(&self, schema: &TableSchema, mode: SaveMode) -> String;
}

impl ToSql for [Verse] {
    fn to_sql(&self, schema: &TableSchema, mode: SaveMode) -> String {
        match mode {
            SaveMode::CreateTableInsert => to_create_insert_sql(self, schema),
            SaveMode::AddColumnUpdateExistingTable => to_add_column_update_sql(self, schema),
        }
    }
}

impl ToSql for Corpus {
    fn to_sql(&self, schema: &TableSchema, mode: SaveMode) -> String {
        self.verses().to_sql(schema, mode)
    }
}

/// Generate CREATE TABLE + INSERT SQL. Expects canonical order.
fn to_create_insert_sql(verses: &[Verse], schema: &TableSchema) -> String {
    let TableSchema {
        table,
        surah_column,
        aya_column,
        text_column,
    } = schema;

    let mut sql = prelude(verses);

    sql.push_str(&format!(
        "CREATE TABLE `{table}` (\n  `{surah_column}` int(3) NOT NULL,\n  `{aya_column}` int(3) NOT NULL,\n  `{text_column}` text NOT NULL,\n  PRIMARY KEY  (`{surah_column}`, `{aya_column}`)\n);"
    ));
    new_lines(&mut sql, 3);

    let insert_into =
        format!("INSERT INTO `{table}` (`{surah_column}`, `{aya_column}`, `{text_column}`) VALUES");

    let mut current_surah: Option<u32> = None;
    let last = verses.len().saturating_sub(1);

    for (i, verse) in verses.iter().enumerate() {
        if current_surah != Some(verse.surah) {
            // Close the previous surah's statement
            if current_surah.is_some() {
                sql.push(';');
                new_lines(&mut sql, 2);
            }
            current_surah = Some(verse.surah);

            sql.push_str(&format!("-- Surah {}", verse.surah));
            new_lines(&mut sql, 1);
            sql.push_str(&insert_into);
            new_lines(&mut sql, 1);
        } else {
            sql.push(',');
            new_lines(&mut sql, 1);
        }

        sql.push_str(&format!(
            "({}, {}, {})",
            verse.surah,
            verse.aya,
            text_literal(&verse.text)
        ));

        if i == last {
            sql.push(';');
            new_lines(&mut sql, 2);
        }
    }

    sql
}

/// Generate ALTER TABLE + UPDATE SQL.
fn to_add_column_update_sql(verses: &[Verse], schema: &TableSchema) -> String {
    let TableSchema {
        table,
        surah_column,
        aya_column,
        text_column,
    } = schema;

    let mut sql = prelude(verses);

    sql.push_str(&format!(
        "ALTER TABLE `{table}` ADD COLUMN `{text_column}` text NOT NULL DEFAULT '';"
    ));
    new_lines(&mut sql, 2);

    let mut current_surah: Option<u32> = None;

    for verse in verses {
        if current_surah != Some(verse.surah) {
            current_surah = Some(verse.surah);
            new_lines(&mut sql, 2);
            sql.push_str(&format!("-- Surah {}", verse.surah));
            new_lines(&mut sql, 1);
        }

        sql.push_str(&format!(
            "UPDATE `{table}` SET `{text_column}` = {} WHERE `{surah_column}` = {} AND `{aya_column}` = {};",
            text_literal(&verse.text),
            verse.surah,
            verse.aya
        ));
        new_lines(&mut sql, 1);
    }

    sql
}

/// Notice and encoding pragma shared by both modes, in a buffer sized for
/// the rest of the script.
fn prelude(verses: &[Verse]) -> String {
    let text_bytes: usize = verses.iter().map(|v| v.text.len()).sum();
    let mut sql = String::with_capacity(TANZIL_NOTICE.len() + text_bytes + verses.len() * 160);

    new_lines(&mut sql, 1);
    sql.push_str(TANZIL_NOTICE);
    new_lines(&mut sql, 2);
    sql.push_str(PRAGMA_ENCODING);
    new_lines(&mut sql, 2);
    sql
}

fn new_lines(sql: &mut String, count: usize) {
    for _ in 0..count {
        sql.push('\n');
    }
}

/// Single-quoted SQL string literal with embedded quotes doubled.
fn text_literal(text: &str) -> String {
    let escaped: Cow<'_, str> = if text.contains('\'') {
        Cow::Owned(text.replace('\'', "''"))
    } else {
        Cow::Borrowed(text)
    };
    format!("'{}'", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::verse::Corpus;
    use pretty_assertions::assert_eq;

    fn two_surahs() -> Vec<Verse> {
        vec![
            Verse::new(1, 1, "a1"),
            Verse::new(1, 2, "a2"),
            Verse::new(2, 0, "b0"),
            Verse::new(2, 1, "b1"),
        ]
    }

    fn schema() -> TableSchema {
        TableSchema {
            table: "quran".to_string(),
            surah_column: "sura".to_string(),
            aya_column: "aya".to_string(),
            text_column: "body".to_string(),
        }
    }

    #[test]
    fn test_create_insert_small() {
        let sql = two_surahs().to_sql(&schema(), SaveMode::CreateTableInsert);
        let expected = format!(
            "\n{TANZIL_NOTICE}\n\nPRAGMA encoding=\"UTF-8\";\n\n\
CREATE TABLE `quran` (
  `sura` int(3) NOT NULL,
  `aya` int(3) NOT NULL,
  `body` text NOT NULL,
  PRIMARY KEY  (`sura`, `aya`)
);


-- Surah 1
INSERT INTO `quran` (`sura`, `aya`, `body`) VALUES
(1, 1, 'a1'),
(1, 2, 'a2');

-- Surah 2
INSERT INTO `quran` (`sura`, `aya`, `body`) VALUES
(2, 0, 'b0'),
(2, 1, 'b1');

"
        );
        assert_eq!(sql, expected);
    }

    #[test]
    fn test_add_column_update_small() {
        let sql = two_surahs().to_sql(&schema(), SaveMode::AddColumnUpdateExistingTable);
        let expected = format!(
            "\n{TANZIL_NOTICE}\n\nPRAGMA encoding=\"UTF-8\";\n\n\
ALTER TABLE `quran` ADD COLUMN `body` text NOT NULL DEFAULT '';



-- Surah 1
UPDATE `quran` SET `body` = 'a1' WHERE `sura` = 1 AND `aya` = 1;
UPDATE `quran` SET `body` = 'a2' WHERE `sura` = 1 AND `aya` = 2;


-- Surah 2
UPDATE `quran` SET `body` = 'b0' WHERE `sura` = 2 AND `aya` = 0;
UPDATE `quran` SET `body` = 'b1' WHERE `sura` = 2 AND `aya` = 1;
"
        );
        assert_eq!(sql, expected);
    }

    #[test]
    fn test_create_insert_full_corpus_counts() {
        let corpus = Corpus::assemble(fixtures::tanzil_verses());
        let sql = corpus.to_sql(&TableSchema::default(), SaveMode::CreateTableInsert);
        assert_eq!(sql.matches("INSERT INTO").count(), 114);
        assert_eq!(sql.matches("');\n").count(), 114);
        assert_eq!(sql.matches("-- Surah ").count(), 114);
        assert_eq!(sql.matches("CREATE TABLE").count(), 1);
        assert!(sql.ends_with("(114, 6, 'verse 114:6');\n\n"));
    }

    #[test]
    fn test_add_column_update_full_corpus_counts() {
        let corpus = Corpus::assemble(fixtures::tanzil_verses());
        let sql = corpus.to_sql(&TableSchema::default(), SaveMode::AddColumnUpdateExistingTable);
        assert_eq!(sql.matches("ALTER TABLE").count(), 1);
        assert_eq!(sql.matches("UPDATE `ayaDBTable`").count(), 6348);
        assert_eq!(sql.matches("-- Surah ").count(), 114);
    }

    #[test]
    fn test_notice_is_kept_verbatim() {
        let sql = two_surahs().to_sql(&TableSchema::default(), SaveMode::CreateTableInsert);
        assert!(sql.starts_with("\n--===================================================================="));
        assert!(sql.contains("--  Tanzil Quran Text (Simple, Version 1.1)\n"));
        assert!(sql.contains("--  Please check updates at: http://tanzil.net/updates/\n"));
    }

    #[test]
    fn test_single_quotes_are_doubled() {
        let verses = vec![Verse::new(1, 1, "it's")];
        let sql = verses.to_sql(&TableSchema::default(), SaveMode::CreateTableInsert);
        assert!(sql.contains("(1, 1, 'it''s');"));
        let sql = verses.to_sql(&TableSchema::default(), SaveMode::AddColumnUpdateExistingTable);
        assert!(sql.contains("= 'it''s' WHERE"));
    }

    #[test]
    fn test_empty_collection_renders_prelude_only() {
        let sql = Vec::<Verse>::new().to_sql(&TableSchema::default(), SaveMode::CreateTableInsert);
        assert!(!sql.contains("INSERT INTO"));
        assert!(sql.ends_with(");\n\n\n"));
    }

    #[test]
    fn test_output_file_name() {
        let schema = TableSchema::default();
        assert_eq!(
            output_file_name(&schema, SaveMode::CreateTableInsert),
            "ayaDBTable-createTableInsert-sqlite.sql"
        );
        assert_eq!(
            output_file_name(&schema, SaveMode::AddColumnUpdateExistingTable),
            "ayaDBTable-addColumnUpdateExistingTable-sqlite.sql"
        );
    }

    #[test]
    fn test_save_mode_from_str() {
        assert_eq!(
            "createTableInsert".parse::<SaveMode>().unwrap(),
            SaveMode::CreateTableInsert
        );
        assert_eq!(
            "update".parse::<SaveMode>().unwrap(),
            SaveMode::AddColumnUpdateExistingTable
        );
        assert!("upsert".parse::<SaveMode>().is_err());
    }
}
