use aligned_vec::{AVec, ConstAlign};
use ordered_float::OrderedFloat;

use crate::Point;

/// Alignment for every bulk array: one cache line, and wide enough for any
/// current vector ISA's aligned loads.
pub(crate) const ALIGN: usize = 64;

pub(crate) type Aligned<T> = AVec<T, ConstAlign<ALIGN>>;

/// One rank bucket of the mipmap tier, sorted along a single axis.
///
/// Three parallel arrays: `keys` holds the sort-axis coordinate and is
/// nondecreasing, `others` holds the cross-axis coordinate permuted in
/// lockstep, and `origins` holds each entry's index into the engine's
/// rank-sorted point array. A bucket is materialized twice, once per axis.
pub(crate) struct Shard {
    keys: Aligned<f32>,
    others: Aligned<f32>,
    origins: Aligned<u32>,
}

impl Shard {
    /// Shard sorted by x; `others` carries y.
    pub(crate) fn from_x(points: &[Point], base: u32) -> Self {
        Self::build(points, base, |p| (p.x, p.y))
    }

    /// Shard sorted by y; `others` carries x.
    pub(crate) fn from_y(points: &[Point], base: u32) -> Self {
        Self::build(points, base, |p| (p.y, p.x))
    }

    /// `points` is one bucket of the rank-sorted point array starting at
    /// absolute index `base`, so `base + i` is entry `i`'s origin.
    fn build(points: &[Point], base: u32, project: impl Fn(&Point) -> (f32, f32)) -> Self {
        let mut order = (0..points.len() as u32).collect::<Vec<_>>();
        order.sort_unstable_by_key(|&i| OrderedFloat(project(&points[i as usize]).0));

        let mut keys = AVec::with_capacity(ALIGN, points.len());
        let mut others = AVec::with_capacity(ALIGN, points.len());
        let mut origins = AVec::with_capacity(ALIGN, points.len());
        for &i in &order {
            let (key, other) = project(&points[i as usize]);
            keys.push(key);
            others.push(other);
            origins.push(base + i);
        }

        Self {
            keys,
            others,
            origins,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn others(&self) -> &[f32] {
        &self.others
    }

    pub(crate) fn origins(&self) -> &[u32] {
        &self.origins
    }

    /// First index in `[first, last)` whose key is `>= value`, or `last`.
    pub(crate) fn lower_bound(&self, value: f32, first: usize, last: usize) -> usize {
        first + self.keys[first..last].partition_point(|&k| k < value)
    }

    /// First index in `[first, last)` whose key is `> value`, or `last`.
    pub(crate) fn upper_bound(&self, value: f32, first: usize, last: usize) -> usize {
        first + self.keys[first..last].partition_point(|&k| !(value < k))
    }
}

/// Table mapping lower-bound indices in `from` to bracketing indices in `to`.
///
/// For any probe `v` with `i = from.lower_bound(v)`, the true
/// `to.lower_bound(v)` lies in `[table[i], table[i + 1]]`. The table is two
/// entries longer than `from` so the `i + 1` access is always in range. The
/// walk is monotone: the destination cursor only ever advances.
pub(crate) fn lower_cascade(from: &Shard, to: &Shard) -> Vec<u32> {
    cascade(from, to, Shard::lower_bound)
}

/// Upper-bound counterpart of [`lower_cascade`], with the same bracketing
/// guarantee for `upper_bound` probes.
pub(crate) fn upper_cascade(from: &Shard, to: &Shard) -> Vec<u32> {
    cascade(from, to, Shard::upper_bound)
}

fn cascade(from: &Shard, to: &Shard, bound: fn(&Shard, f32, usize, usize) -> usize) -> Vec<u32> {
    let mut table = Vec::with_capacity(from.len() + 2);
    table.push(0);
    let mut cursor = 0;
    for &key in from.keys.iter() {
        cursor = bound(to, key, cursor, to.len());
        table.push(cursor as u32);
    }
    table.push(to.len() as u32);
    table
}
