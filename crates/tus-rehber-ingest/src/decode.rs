use crate::csv::{parse_opt_f64, parse_opt_i64};
use tus_rehber_model::{Institution, PlacementRecord};

const INSTITUTION_FIELDS: usize = 5;
const PLACEMENT_FIELDS: usize = 13;

/// Decode institution records: `code;name;ownership;kind;city`. Rows that are
/// too short or carry an unparseable code are skipped and counted.
#[must_use]
pub fn decode_institutions(records: &[Vec<String>]) -> (Vec<Institution>, u64) {
    let mut out = Vec::new();
    let mut skipped = 0_u64;
    for record in records {
        if record.len() < INSTITUTION_FIELDS {
            skipped += 1;
            continue;
        }
        let Some(institution_code) = parse_opt_i64(&record[0]) else {
            skipped += 1;
            continue;
        };
        out.push(Institution {
            institution_code,
            name: record[1].clone(),
            ownership_type: record[2].clone(),
            institution_kind: record[3].clone(),
            city: record[4].clone(),
        });
    }
    (out, skipped)
}

/// Decode placement records:
/// `id;code;level_short;level;branch;period;period_date;quota;filled;unfilled;min_score;max_score;min_score_rank`.
/// The leading source id is discarded. Institution code and quota are
/// required; every other numeric stays nullable.
#[must_use]
pub fn decode_placements(records: &[Vec<String>]) -> (Vec<PlacementRecord>, u64) {
    let mut out = Vec::new();
    let mut skipped = 0_u64;
    for record in records {
        if record.len() < PLACEMENT_FIELDS {
            skipped += 1;
            continue;
        }
        let (Some(institution_code), Some(quota)) =
            (parse_opt_i64(&record[1]), parse_opt_i64(&record[7]))
        else {
            skipped += 1;
            continue;
        };
        out.push(PlacementRecord {
            institution_code,
            level_short_name: record[2].clone(),
            level: record[3].clone(),
            branch: record[4].clone(),
            period: record[5].clone(),
            period_date: record[6].clone(),
            quota,
            filled: parse_opt_i64(&record[8]),
            unfilled_quota: parse_opt_i64(&record[9]),
            min_score: parse_opt_f64(&record[10]),
            max_score: parse_opt_f64(&record[11]),
            min_score_rank: parse_opt_i64(&record[12]),
        });
    }
    (out, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv::parse_delimited_records;

    #[test]
    fn short_and_codeless_institution_rows_are_skipped() {
        let records = parse_delimited_records("1;A;state;hospital;Ankara\nbad;row\nxx;B;state;hospital;Izmir\n", ';');
        let (institutions, skipped) = decode_institutions(&records);
        assert_eq!(institutions.len(), 1);
        assert_eq!(skipped, 2);
        assert_eq!(institutions[0].institution_code, 1);
    }

    #[test]
    fn placement_null_tokens_stay_null() {
        let raw = "7;100;S;Specialty;Cardiology;2025/2;2025-09-01;4;NULL;NULL;--;--;NULL\n";
        let (placements, skipped) = decode_placements(&parse_delimited_records(raw, ';'));
        assert_eq!(skipped, 0);
        let p = &placements[0];
        assert_eq!(p.quota, 4);
        assert_eq!(p.filled, None);
        assert_eq!(p.unfilled_quota, None);
        assert_eq!(p.min_score, None);
        assert_eq!(p.max_score, None);
        assert_eq!(p.min_score_rank, None);
    }

    #[test]
    fn missing_quota_skips_the_row() {
        let raw = "7;100;S;Specialty;Cardiology;2025/2;2025-09-01;--;1;0;70,5;80;1000\n";
        let (placements, skipped) = decode_placements(&parse_delimited_records(raw, ';'));
        assert!(placements.is_empty());
        assert_eq!(skipped, 1);
    }

    #[test]
    fn decimal_comma_scores_decode() {
        let raw = "7;100;S;Specialty;Cardiology;2024/1;2024-04-01;4;4;0;78,5;91,2;1200\n";
        let (placements, _) = decode_placements(&parse_delimited_records(raw, ';'));
        assert_eq!(placements[0].min_score, Some(78.5));
        assert_eq!(placements[0].max_score, Some(91.2));
    }
}
