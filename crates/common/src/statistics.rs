use std::collections::BTreeMap;

use serde::Serialize;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::resource::ResourceKind;

const DAY_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// One secret record's statistics-relevant fields, as scanned from a store.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessTally {
    pub created: OffsetDateTime,
    pub kind: ResourceKind,
    pub number_of_accesses: i64,
}

/// Per-day counts of accessed secrets, split by resource kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DayCounts {
    pub files: u64,
    pub links: u64,
}

/// Render a timestamp as the `YYYY-MM-DD` bucket key for its UTC day.
pub fn day_key(created: OffsetDateTime) -> String {
    created
        .date()
        .format(&DAY_FORMAT)
        .expect("formatting a date cannot fail")
}

/// Fold scanned records into per-day buckets.
///
/// A record contributes one unit to its creation day's bucket if it has
/// been accessed at least once; untouched records contribute nothing, and
/// days without any contributing record do not appear at all. Each day
/// key appears once carrying both counts.
pub fn aggregate(tallies: &[AccessTally]) -> BTreeMap<String, DayCounts> {
    let mut days: BTreeMap<String, DayCounts> = BTreeMap::new();

    for tally in tallies {
        if tally.number_of_accesses <= 0 {
            continue;
        }
        let counts = days.entry(day_key(tally.created)).or_default();
        match tally.kind {
            ResourceKind::File => counts.files += 1,
            ResourceKind::Url => counts.links += 1,
        }
    }

    days
}
