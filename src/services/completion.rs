use crate::models::project::Milestone;
use crate::models::reflection::EqReflectionItem;
use crate::models::tracker::SubItem;

/// Anything with a completion flag that feeds a parent's percentage.
pub trait Checkable {
    fn is_completed(&self) -> bool;
}

impl Checkable for SubItem {
    fn is_completed(&self) -> bool {
        self.completed
    }
}

impl Checkable for Milestone {
    fn is_completed(&self) -> bool {
        self.completed
    }
}

impl Checkable for EqReflectionItem {
    fn is_completed(&self) -> bool {
        self.completed
    }
}

impl<T: Checkable + ?Sized> Checkable for &T {
    fn is_completed(&self) -> bool {
        (**self).is_completed()
    }
}

/// Percentage of completed items in `[0, 100]`; an empty collection is 0.
///
/// Always counts from scratch so the result cannot drift from the items.
pub fn completion_percentage<I>(items: I) -> f64
where
    I: IntoIterator,
    I::Item: Checkable,
{
    let (completed, total) = items
        .into_iter()
        .fold((0usize, 0usize), |(completed, total), item| {
            (completed + usize::from(item.is_completed()), total + 1)
        });

    if total == 0 {
        0.0
    } else {
        (completed as f64 / total as f64) * 100.0
    }
}
