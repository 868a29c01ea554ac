use std::cmp::Ordering;

use crate::models::{ADMIN_ID, EVERYONE_ID, GroupEntry, SortMode};
use crate::utils::alphanum;

/// Number of list rows appended per render batch.
pub const RENDER_BATCH: usize = 100;

/// Total order over roster entries:
/// everyone first, admin second, then (in member-count mode) larger groups
/// first, then natural name order. Ids settle anything left.
pub fn compare_entries(a: &GroupEntry, b: &GroupEntry, mode: SortMode) -> Ordering {
    pinned_rank(a)
        .cmp(&pinned_rank(b))
        .then_with(|| match mode {
            SortMode::ByMemberCount => compare_counts(a, b),
            SortMode::ByName => Ordering::Equal,
        })
        .then_with(|| alphanum(&a.display_name, &b.display_name))
        .then_with(|| a.id.cmp(&b.id))
}

pub fn sort_entries(entries: &mut [GroupEntry], mode: SortMode) {
    entries.sort_by(|a, b| compare_entries(a, b, mode));
}

fn pinned_rank(entry: &GroupEntry) -> u8 {
    match entry.id.as_str() {
        EVERYONE_ID => 0,
        ADMIN_ID => 1,
        _ => 2,
    }
}

// Only a positive, strictly larger count wins; ties and zero fall through.
fn compare_counts(a: &GroupEntry, b: &GroupEntry) -> Ordering {
    let (ca, cb) = (a.member_count.value(), b.member_count.value());
    if ca > 0 && ca > cb {
        Ordering::Less
    } else if cb > 0 && cb > ca {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}
