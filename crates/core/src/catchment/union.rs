use std::panic;

use geo::{BooleanOps, MultiPolygon, Polygon};

#[derive(Debug, Clone, thiserror::Error)]
#[error("polygon union failed: {0}")]
pub struct UnionFailure(pub String);

/// Result of folding a set of discs into one shape.
#[derive(Debug, Clone)]
pub struct UnionOutcome {
    pub polygon: MultiPolygon,
    /// Pairs whose union failed and were left out of `polygon`.
    pub failures: usize,
}

/// Attempt to union two multipolygons, catching any panics
pub fn try_union(a: &MultiPolygon, b: &MultiPolygon) -> Result<MultiPolygon, UnionFailure> {
    let result = panic::catch_unwind(panic::AssertUnwindSafe(|| a.union(b)));

    match result {
        Ok(merged) if merged.0.is_empty() && !(a.0.is_empty() && b.0.is_empty()) => {
            Err(UnionFailure("boolean op produced an empty shape".to_owned()))
        }
        Ok(merged) => Ok(merged),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "boolean op panicked".to_owned());
            Err(UnionFailure(message))
        }
    }
}

/// Left fold `union(union(union(d0, d1), d2) ..., dN)` using [`try_union`].
pub fn union_fold(discs: Vec<Polygon>) -> UnionOutcome {
    union_fold_with(discs, try_union)
}

/// Left fold with a caller-provided pairwise union.
///
/// A failing pair keeps the accumulated shape and drops that disc; the fold
/// carries on with the next one.
pub fn union_fold_with<F>(discs: Vec<Polygon>, mut union: F) -> UnionOutcome
where
    F: FnMut(&MultiPolygon, &MultiPolygon) -> Result<MultiPolygon, UnionFailure>,
{
    let mut discs = discs.into_iter();
    let Some(first) = discs.next() else {
        return UnionOutcome {
            polygon: MultiPolygon::new(vec![]),
            failures: 0,
        };
    };

    let mut accumulated = MultiPolygon::new(vec![first]);
    let mut failures = 0;

    for (index, disc) in discs.enumerate() {
        let next = MultiPolygon::new(vec![disc]);
        match union(&accumulated, &next) {
            Ok(merged) => accumulated = merged,
            Err(error) => {
                failures += 1;
                tracing::warn!("skipping disc {} in union: {error}", index + 1);
            }
        }
    }

    UnionOutcome {
        polygon: accumulated,
        failures,
    }
}
