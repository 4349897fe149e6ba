//! Replay feed parsing.
//!
//! Reads the upstream `GGST_replays.csv` snapshot into [`RawMatch`] rows.
//! Columns the aggregation does not use are ignored. Rows that fail to
//! deserialize are skipped and counted. A header missing a required column,
//! or a body where every row is malformed, rejects the whole snapshot.

use thiserror::Error;
use tracing::warn;

use crate::models::RawMatch;

/// Columns every snapshot must carry.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    "floor",
    "playerACharCode",
    "playerBCharCode",
    "winnerCharCode",
    "loserCharCode",
];

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Snapshot is missing required column {0:?}")]
    MissingColumn(&'static str),

    #[error("Snapshot has no readable rows ({malformed} malformed)")]
    NoValidRows { malformed: usize },
}

/// Result of parsing a snapshot.
#[derive(Debug, Clone, Default)]
pub struct ParsedMatches {
    pub matches: Vec<RawMatch>,
    /// Rows that could not be read (1-based data row numbers)
    pub malformed: Vec<usize>,
}

/// Parse a replay CSV snapshot.
pub fn parse_matches(csv_text: &str) -> Result<ParsedMatches, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(csv_text.as_bytes());

    let headers = reader.headers()?.clone();
    if let Some(missing) = REQUIRED_COLUMNS
        .iter()
        .find(|col| !headers.iter().any(|h| h == **col))
    {
        return Err(IngestError::MissingColumn(*missing));
    }

    let mut parsed = ParsedMatches::default();
    for (i, record) in reader.deserialize::<RawMatch>().enumerate() {
        match record {
            Ok(m) => parsed.matches.push(m),
            Err(e) => {
                warn!("Skipping malformed replay row {}: {}", i + 1, e);
                parsed.malformed.push(i + 1);
            }
        }
    }

    if parsed.matches.is_empty() && !parsed.malformed.is_empty() {
        return Err(IngestError::NoValidRows {
            malformed: parsed.malformed.len(),
        });
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = "\
timestamp,floor,playerAID,playerBID,playerACharCode,playerBCharCode,winner,winnerCharCode,loserCharCode
2022-03-01 10:00:00,3,111,222,0,1,1,0,1
2022-03-01 10:05:00,99,333,444,17,13,2,13,17
";

    #[test]
    fn test_parse_ignores_extra_columns() {
        let parsed = parse_matches(SNAPSHOT).unwrap();

        assert_eq!(parsed.matches.len(), 2);
        assert!(parsed.malformed.is_empty());
        assert_eq!(
            parsed.matches[0],
            RawMatch {
                floor: 3,
                player_a_char_code: 0,
                player_b_char_code: 1,
                winner: Some("1".to_string()),
                winner_char_code: 0,
                loser_char_code: 1,
            }
        );
        assert_eq!(parsed.matches[1].floor, 99);
        assert_eq!(parsed.matches[1].winner_char_code, 13);
    }

    #[test]
    fn test_parse_skips_malformed_rows() {
        let text = "\
floor,playerACharCode,playerBCharCode,winner,winnerCharCode,loserCharCode
1,0,1,1,0,1
2,zero,1,1,0,1
3,2,3,2,3
4,4,5,1,4,5
";
        let parsed = parse_matches(text).unwrap();

        assert_eq!(parsed.matches.len(), 2);
        assert_eq!(parsed.malformed, vec![2, 3]);
        assert_eq!(parsed.matches[1].floor, 4);
    }

    #[test]
    fn test_parse_winner_column_optional() {
        let text = "floor,playerACharCode,playerBCharCode,winnerCharCode,loserCharCode\n5,6,7,7,6\n";
        let parsed = parse_matches(text).unwrap();

        assert_eq!(parsed.matches.len(), 1);
        assert_eq!(parsed.matches[0].winner, None);
    }

    #[test]
    fn test_parse_missing_column() {
        let text = "floor,playerACharCode,playerBCharCode,winnerCharCode\n1,0,1,0\n";
        let err = parse_matches(text).unwrap_err();
        assert!(matches!(err, IngestError::MissingColumn("loserCharCode")));
    }

    #[test]
    fn test_parse_all_rows_malformed() {
        let text = "\
floor,playerACharCode,playerBCharCode,winner,winnerCharCode,loserCharCode
3,0.0,1.0,1,0.0,1.0
3,1.0,0.0,1,1.0,0.0
";
        let err = parse_matches(text).unwrap_err();
        assert!(matches!(err, IngestError::NoValidRows { malformed: 2 }));
    }

    #[test]
    fn test_parse_empty_body() {
        let text = "floor,playerACharCode,playerBCharCode,winnerCharCode,loserCharCode\n";
        let parsed = parse_matches(text).unwrap();
        assert!(parsed.matches.is_empty());
    }
}
