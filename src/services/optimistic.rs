//! Apply locally, confirm remotely, revert on rejection.

use std::collections::BTreeMap;
use std::future::Future;

use tracing::{debug, warn};

use crate::error::AppResult;
use crate::services::reorder::Identified;
use crate::services::state::VersionedState;

/// Collection whose entries can be addressed by key for patching.
pub trait PatchTarget<K, T> {
    fn slot_mut(&mut self, key: &K) -> Option<&mut T>;
}

impl<T: Identified> PatchTarget<String, T> for Vec<T> {
    fn slot_mut(&mut self, key: &String) -> Option<&mut T> {
        self.iter_mut().find(|item| item.ident() == key.as_str())
    }
}

impl<K: Ord, T> PatchTarget<K, T> for BTreeMap<K, T> {
    fn slot_mut(&mut self, key: &K) -> Option<&mut T> {
        self.get_mut(key)
    }
}

/// Accessor pair for one field of `T`.
pub struct FieldLens<T, V> {
    pub name: &'static str,
    pub get: fn(&T) -> V,
    pub set: fn(&mut T, V),
}

impl<T, V> Clone for FieldLens<T, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, V> Copy for FieldLens<T, V> {}

/// Record of a single applied field change.
pub struct AppliedPatch<K, T, V> {
    key: K,
    lens: FieldLens<T, V>,
    previous: V,
    applied: V,
}

impl<K, T, V: PartialEq> AppliedPatch<K, T, V> {
    pub fn previous(&self) -> &V {
        &self.previous
    }

    /// Restores the previous value of this one field.
    ///
    /// Skipped when the entry is gone or the field was changed again since.
    pub fn revert<C>(self, collection: &mut C) -> bool
    where
        C: PatchTarget<K, T>,
    {
        let Some(slot) = collection.slot_mut(&self.key) else {
            return false;
        };
        if (self.lens.get)(slot) != self.applied {
            debug!(target: "app::optimistic", field = self.lens.name, "field changed again, not reverting");
            return false;
        }
        (self.lens.set)(slot, self.previous);
        true
    }
}

/// Sets one field of the entry at `key`. `None` when the key is unknown.
pub fn apply_patch<C, K, T, V>(
    collection: &mut C,
    key: K,
    lens: FieldLens<T, V>,
    value: V,
) -> Option<AppliedPatch<K, T, V>>
where
    C: PatchTarget<K, T>,
    V: Clone,
{
    let slot = collection.slot_mut(&key)?;
    let previous = (lens.get)(slot);
    (lens.set)(slot, value.clone());
    Some(AppliedPatch {
        key,
        lens,
        previous,
        applied: value,
    })
}

/// Applies `value` to `state`, awaits `confirm`, and reverts only that field
/// if confirmation fails. Unknown keys are a no-op returning `Ok(None)`.
pub async fn apply_confirm_revert<C, K, T, V, F, Fut, R>(
    state: &VersionedState<C>,
    key: K,
    lens: FieldLens<T, V>,
    value: V,
    confirm: F,
) -> AppResult<Option<R>>
where
    C: PatchTarget<K, T> + Clone,
    V: Clone + PartialEq,
    F: FnOnce() -> Fut,
    Fut: Future<Output = AppResult<R>>,
{
    let patch = state.modify(|collection| apply_patch(collection, key, lens, value))?;
    let Some(patch) = patch else {
        return Ok(None);
    };

    match confirm().await {
        Ok(result) => Ok(Some(result)),
        Err(err) => {
            let field = lens.name;
            let reverted = state.modify(|collection| patch.revert(collection))?;
            warn!(
                target: "app::optimistic",
                field,
                reverted,
                error = %err,
                "remote confirmation failed"
            );
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: String,
        done: bool,
        note: String,
    }

    impl Identified for Row {
        fn ident(&self) -> &str {
            &self.id
        }
    }

    const DONE: FieldLens<Row, bool> = FieldLens {
        name: "done",
        get: |row| row.done,
        set: |row, value| row.done = value,
    };

    fn rows() -> Vec<Row> {
        vec![
            Row {
                id: "a".into(),
                done: false,
                note: "first".into(),
            },
            Row {
                id: "b".into(),
                done: false,
                note: "second".into(),
            },
        ]
    }

    #[test]
    fn revert_restores_only_the_patched_field() {
        let mut items = rows();
        let patch = apply_patch(&mut items, "a".to_string(), DONE, true).expect("patched");
        assert!(items[0].done);

        items[0].note = "edited meanwhile".into();
        assert!(patch.revert(&mut items));
        assert!(!items[0].done);
        assert_eq!(items[0].note, "edited meanwhile");
    }

    #[test]
    fn unknown_key_is_not_patched() {
        let mut items = rows();
        assert!(apply_patch(&mut items, "zzz".to_string(), DONE, true).is_none());
        assert_eq!(items, rows());
    }

    #[tokio::test]
    async fn failed_confirmation_reverts() {
        let state = VersionedState::new("rows", rows());
        let result: AppResult<Option<()>> =
            apply_confirm_revert(&state, "b".to_string(), DONE, true, || async {
                Err(AppError::persistence("row", "offline"))
            })
            .await;

        assert!(matches!(result, Err(AppError::Persistence { .. })));
        assert_eq!(state.snapshot().expect("snapshot"), rows());
    }

    #[tokio::test]
    async fn successful_confirmation_keeps_value() {
        let state = VersionedState::new("rows", rows());
        let result = apply_confirm_revert(&state, "b".to_string(), DONE, true, || async {
            Ok::<_, AppError>(42)
        })
        .await
        .expect("confirmed");

        assert_eq!(result, Some(42));
        assert!(state.snapshot().expect("snapshot")[1].done);
    }
}
