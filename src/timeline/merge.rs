use chrono::FixedOffset;

use super::types::{DayGroup, TimelineItem};
use crate::models::{ContextNote, PainEntry};

/// Merges both sources, most recent first.
///
/// Equal instants keep insertion order: pain entries before notes, each in
/// source order. `sort_by` is stable, which this relies on.
pub fn merge(entries: Vec<PainEntry>, notes: Vec<ContextNote>) -> Vec<TimelineItem> {
    let mut items: Vec<TimelineItem> = entries
        .into_iter()
        .map(TimelineItem::PainEntry)
        .chain(notes.into_iter().map(TimelineItem::ContextNote))
        .collect();
    items.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
    items
}

/// Buckets sorted items by calendar date in `zone`, keeping their order.
pub fn group_by_day(items: &[TimelineItem], zone: &FixedOffset) -> Vec<DayGroup> {
    let mut groups: Vec<DayGroup> = Vec::new();
    for item in items {
        let date = item.timestamp().with_timezone(zone).date_naive();
        match groups.iter_mut().find(|g| g.date == date) {
            Some(group) => group.items.push(item.clone()),
            None => groups.push(DayGroup {
                date,
                items: vec![item.clone()],
            }),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use uuid::Uuid;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, h, m, 0).unwrap()
    }

    fn entry(started_at: DateTime<Utc>) -> PainEntry {
        PainEntry {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            started_at,
            intensity: 5,
            has_aura: false,
            location: None,
            medications: vec![],
            notes: None,
            created_at: started_at,
        }
    }

    fn note(occurred_at: DateTime<Utc>) -> ContextNote {
        ContextNote {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            text: "Wetterwechsel".into(),
            occurred_at,
            created_at: occurred_at,
            deleted_at: None,
        }
    }

    #[test]
    fn merge_sorts_descending() {
        let items = merge(vec![entry(at(8, 0)), entry(at(12, 0))], vec![note(at(10, 0))]);
        let hours: Vec<_> = items.iter().map(|i| i.timestamp()).collect();
        assert_eq!(hours, vec![at(12, 0), at(10, 0), at(8, 0)]);
    }

    #[test]
    fn equal_instants_keep_insertion_order() {
        let e1 = entry(at(9, 0));
        let e2 = entry(at(9, 0));
        let n1 = note(at(9, 0));
        let n2 = note(at(9, 0));
        let expected = vec![e1.id, e2.id, n1.id, n2.id];

        let items = merge(vec![e1, e2], vec![n1, n2]);
        let ids: Vec<_> = items.iter().map(TimelineItem::id).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn merge_of_empty_sources_is_empty() {
        assert!(merge(vec![], vec![]).is_empty());
    }

    #[test]
    fn grouping_uses_reference_zone() {
        let zone = FixedOffset::east_opt(3600).unwrap();
        // 23:30 UTC on the 10th is already the 11th at +01:00
        let late = Utc.with_ymd_and_hms(2026, 3, 10, 23, 30, 0).unwrap();
        let items = merge(vec![entry(late), entry(at(8, 0))], vec![note(at(7, 0))]);

        let groups = group_by_day(&items, &zone);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].date, NaiveDate::from_ymd_opt(2026, 3, 11).unwrap());
        assert_eq!(groups[0].items.len(), 1);
        assert_eq!(groups[1].date, NaiveDate::from_ymd_opt(2026, 3, 10).unwrap());
        assert!(groups[1].items[0].is_pain_entry());
        assert!(!groups[1].items[1].is_pain_entry());
    }
}
