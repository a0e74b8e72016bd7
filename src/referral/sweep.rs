use super::types::ReferralCode;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    Expired,
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removed {
    pub record: ReferralCode,
    pub reason: RemovalReason,
}

/// Split codes into live ones and ones that must be dropped
///
/// Order of the kept codes is preserved. Expiry wins over exhaustion when
/// both apply.
pub fn sweep(records: Vec<ReferralCode>, now: DateTime<Utc>) -> (Vec<ReferralCode>, Vec<Removed>) {
    let mut kept = Vec::with_capacity(records.len());
    let mut removed = Vec::new();

    for record in records {
        let reason = if record.is_expired(now) {
            Some(RemovalReason::Expired)
        } else if record.is_exhausted() {
            Some(RemovalReason::Exhausted)
        } else {
            None
        };

        match reason {
            Some(reason) => removed.push(Removed { record, reason }),
            None => kept.push(record),
        }
    }

    (kept, removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn code(code: &str, left: u32, expiration: Option<i64>) -> ReferralCode {
        ReferralCode {
            code: code.to_string(),
            activations_left: left,
            expiration,
        }
    }

    #[test]
    fn test_sweep_reports_reasons() {
        let now = Utc.timestamp_opt(10_000, 0).unwrap();
        let records = vec![
            code("aaaaaaaa", 3, None),
            code("bbbbbbbb", 1, Some(9_000)),
            code("cccccccc", 0, None),
            code("dddddddd", 0, Some(1)),
            code("eeeeeeee", 2, Some(20_000)),
        ];

        let (kept, removed) = sweep(records.clone(), now);

        assert_eq!(kept, vec![records[0].clone(), records[4].clone()]);
        let reasons: Vec<_> = removed
            .iter()
            .map(|r| (r.record.code.as_str(), r.reason))
            .collect();
        assert_eq!(
            reasons,
            vec![
                ("bbbbbbbb", RemovalReason::Expired),
                ("cccccccc", RemovalReason::Exhausted),
                ("dddddddd", RemovalReason::Expired),
            ]
        );
    }

    #[test]
    fn test_sweep_is_pure() {
        let now = Utc.timestamp_opt(10_000, 0).unwrap();
        let records = vec![code("aaaaaaaa", 1, Some(5)), code("bbbbbbbb", 1, None)];
        assert_eq!(sweep(records.clone(), now), sweep(records, now));
    }
}
