//! Top-k lowest-rank queries over a static planar point set, filtered by an
//! axis-aligned rectangle.
//!
//! [`RankIndex`] is built once over a point set and then serves read-only
//! queries: the k points of lowest rank inside a rectangle, in ascending
//! rank order. Internally it keeps a flat, vector-scannable tier of the
//! globally best-ranked points and a sequence of geometrically growing
//! rank buckets, each materialized sorted by x and by y and linked by
//! fractional-cascading tables that turn per-level binary searches into
//! narrow bracketed lookups.
//!
//! Query state lives in a caller-owned [`Search`] scratch, so a single
//! index can serve many threads, one scratch per thread:
//!
//! ```
//! use rect_rank::{Point, RankIndex, Rect, Search};
//!
//! let points = [
//!     Point { id: 0, rank: 2, x: 0.5, y: 0.5 },
//!     Point { id: 1, rank: 1, x: 0.25, y: 0.75 },
//!     Point { id: 2, rank: 3, x: 2.0, y: 2.0 },
//! ];
//! let index = RankIndex::new(&points);
//! let mut search = Search::default();
//! let found = index
//!     .search(&Rect::new(0.0, 0.0, 1.0, 1.0), 2, &mut search)
//!     .map(|p| p.rank)
//!     .collect::<Vec<_>>();
//! assert_eq!(found, [1, 2]);
//! ```

use aligned_vec::AVec;
#[cfg(feature = "indicatif")]
use indicatif::ProgressBar;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

mod shard;
mod simd;
mod types;

use shard::{lower_cascade, upper_cascade, Aligned, Shard, ALIGN};
use types::RankHeap;
pub use types::{Point, Rect};

/// Parameters for building a [`RankIndex`].
#[derive(Clone)]
pub struct Builder {
    linear_len: usize,
    bucket_base: usize,
    growth: usize,
    #[cfg(feature = "indicatif")]
    progress: Option<ProgressBar>,
}

impl Builder {
    /// Set the size of the linear tier, the prefix of globally best-ranked
    /// points scanned unconditionally on every query.
    pub fn linear_len(mut self, len: usize) -> Self {
        self.linear_len = len;
        self
    }

    /// Set the size of the first mipmap bucket. Later buckets grow by the
    /// configured growth factor; the last one takes whatever remains.
    pub fn bucket_base(mut self, size: usize) -> Self {
        self.bucket_base = size.max(1);
        self
    }

    /// Set the geometric growth factor between consecutive bucket sizes.
    ///
    /// A factor of 3 beats 2 empirically and uses less memory.
    pub fn growth(mut self, factor: usize) -> Self {
        self.growth = factor.max(1);
        self
    }

    /// A `ProgressBar` to track index construction progress.
    #[cfg(feature = "indicatif")]
    pub fn progress(mut self, bar: ProgressBar) -> Self {
        self.progress = Some(bar);
        self
    }

    /// Build the index over the given points.
    pub fn build(self, points: &[Point]) -> RankIndex {
        RankIndex::with_builder(points, self)
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            linear_len: LINEAR_LEN,
            bucket_base: BUCKET_BASE,
            growth: GROWTH,
            #[cfg(feature = "indicatif")]
            progress: None,
        }
    }
}

/// A static two-tier index answering top-k lowest-rank rectangle queries.
pub struct RankIndex {
    /// All points, sorted by ascending rank. Every other structure refers
    /// into this array by index ("origin").
    points: Vec<Point>,
    /// Coordinates of `points[..linear_len]`, padded to whole vector blocks
    /// with NaN so padding lanes never pass the membership test.
    linear_xs: Aligned<f32>,
    linear_ys: Aligned<f32>,
    linear_len: usize,
    /// One (x-sorted, y-sorted) shard pair per rank bucket.
    x_levels: Vec<Shard>,
    y_levels: Vec<Shard>,
    /// Cascading tables for each adjacent level pair, lower/upper per axis.
    x_lower: Vec<Vec<u32>>,
    x_upper: Vec<Vec<u32>>,
    y_lower: Vec<Vec<u32>>,
    y_upper: Vec<Vec<u32>>,
}

impl RankIndex {
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Build with the reference parameters.
    pub fn new(points: &[Point]) -> Self {
        Builder::default().build(points)
    }

    fn with_builder(input: &[Point], builder: Builder) -> Self {
        // Points with a NaN coordinate can never satisfy an inclusive
        // rectangle test; dropping them up front keeps the shard sort and
        // the bracketing searches free of unordered keys.
        let mut points = input
            .iter()
            .filter(|p| !p.x.is_nan() && !p.y.is_nan())
            .copied()
            .collect::<Vec<_>>();
        assert!(points.len() < u32::MAX as usize);

        // Stable, so equal ranks keep their input order and queries are
        // deterministic.
        points.sort_by_key(|p| p.rank);

        let linear_len = points.len().min(builder.linear_len);
        let padded = (linear_len + 7) & !7;
        let mut linear_xs = AVec::with_capacity(ALIGN, padded);
        let mut linear_ys = AVec::with_capacity(ALIGN, padded);
        for p in &points[..linear_len] {
            linear_xs.push(p.x);
            linear_ys.push(p.y);
        }
        for _ in linear_len..padded {
            linear_xs.push(f32::NAN);
            linear_ys.push(f32::NAN);
        }

        // Carve the remainder into geometrically growing rank buckets.
        let mut buckets = Vec::new();
        let mut start = linear_len;
        let mut size = builder.bucket_base;
        while start < points.len() {
            let end = points.len().min(start + size);
            buckets.push(start..end);
            size = size.saturating_mul(builder.growth);
            start = end;
        }

        #[cfg(feature = "indicatif")]
        let progress = builder.progress;
        #[cfg(feature = "indicatif")]
        if let Some(bar) = &progress {
            bar.set_length(buckets.len() as u64);
            bar.set_message("Building mipmap levels");
        }

        // Levels are independent, so the per-bucket axis sorts fan out
        // across the thread pool.
        let (x_levels, y_levels): (Vec<_>, Vec<_>) = buckets
            .par_iter()
            .map(|range| {
                let bucket = &points[range.clone()];
                let pair = (
                    Shard::from_x(bucket, range.start as u32),
                    Shard::from_y(bucket, range.start as u32),
                );
                #[cfg(feature = "indicatif")]
                if let Some(bar) = &progress {
                    bar.inc(1);
                }
                pair
            })
            .unzip();

        #[cfg(feature = "indicatif")]
        if let Some(bar) = progress {
            bar.finish();
        }

        let x_lower = x_levels
            .windows(2)
            .map(|w| lower_cascade(&w[0], &w[1]))
            .collect();
        let x_upper = x_levels
            .windows(2)
            .map(|w| upper_cascade(&w[0], &w[1]))
            .collect();
        let y_lower = y_levels
            .windows(2)
            .map(|w| lower_cascade(&w[0], &w[1]))
            .collect();
        let y_upper = y_levels
            .windows(2)
            .map(|w| upper_cascade(&w[0], &w[1]))
            .collect();

        Self {
            points,
            linear_xs,
            linear_ys,
            linear_len,
            x_levels,
            y_levels,
            x_lower,
            x_upper,
            y_lower,
            y_upper,
        }
    }

    /// Search for the `count` lowest-ranked points inside `rect`.
    ///
    /// Returns an iterator over the matches in ascending rank order, fewer
    /// than `count` if the rectangle holds fewer. The same query against
    /// the same index always yields the same output.
    pub fn search<'a, 'b: 'a>(
        &'b self,
        rect: &Rect,
        count: usize,
        search: &'a mut Search,
    ) -> impl Iterator<Item = &'b Point> + ExactSizeIterator + 'a {
        search.matches.clear();

        // NaN bounds fail these comparisons too, so a NaN rectangle takes
        // the same path as an inverted one.
        let live =
            count > 0 && !self.points.is_empty() && rect.lx <= rect.hx && rect.ly <= rect.hy;
        if live {
            simd::scan_rect(
                &self.linear_xs,
                &self.linear_ys,
                rect,
                count,
                &mut search.matches,
            );
            if search.matches.len() < count {
                self.descend(rect, count - search.matches.len(), search);
            }
        }

        let points = &self.points;
        search.matches.iter().map(move |&i| &points[i as usize])
    }

    /// Walk the mipmap levels, collecting up to `count` origins into the
    /// scratch heap and appending the committed result to `search.matches`.
    fn descend(&self, rect: &Rect, count: usize, search: &mut Search) {
        let Search { matches, heap } = search;
        // The mipmap can never yield more than it holds; clamping keeps an
        // oversized `count` from reserving a buffer to match.
        heap.reset(count.min(self.points.len() - self.linear_len));

        let (mut x_low, mut x_high) = (0, 0);
        let (mut y_low, mut y_high) = (0, 0);
        for (level, (xs, ys)) in self.x_levels.iter().zip(&self.y_levels).enumerate() {
            if level == 0 {
                x_low = xs.lower_bound(rect.lx, 0, xs.len());
                x_high = xs.upper_bound(rect.hx, x_low, xs.len());
                y_low = ys.lower_bound(rect.ly, 0, ys.len());
                y_high = ys.upper_bound(rect.hy, y_low, ys.len());
            } else {
                // The previous level's bounds index the cascading tables,
                // bracketing this level's binary searches. The +1 slack
                // covers a target sitting exactly on the bracket end.
                let t = &self.x_lower[level - 1];
                x_low = xs.lower_bound(rect.lx, t[x_low] as usize, slack(t[x_low + 1], xs.len()));
                let t = &self.x_upper[level - 1];
                x_high =
                    xs.upper_bound(rect.hx, t[x_high] as usize, slack(t[x_high + 1], xs.len()));
                let t = &self.y_lower[level - 1];
                y_low = ys.lower_bound(rect.ly, t[y_low] as usize, slack(t[y_low + 1], ys.len()));
                let t = &self.y_upper[level - 1];
                y_high =
                    ys.upper_bound(rect.hy, t[y_high] as usize, slack(t[y_high + 1], ys.len()));
            }

            if x_low == x_high || y_low == y_high {
                continue;
            }

            // Scan whichever axis brackets fewer candidates, testing each
            // candidate's cross coordinate against the other pair of bounds.
            if x_high - x_low < y_high - y_low {
                simd::scan_band(
                    &xs.others()[x_low..x_high],
                    &xs.origins()[x_low..x_high],
                    rect.ly,
                    rect.hy,
                    heap,
                );
            } else {
                simd::scan_band(
                    &ys.others()[y_low..y_high],
                    &ys.origins()[y_low..y_high],
                    rect.lx,
                    rect.hx,
                    heap,
                );
            }

            heap.seal();
            if heap.full() {
                // Every later level holds strictly higher ranks than
                // anything committed so far; nothing down there can
                // displace a committed entry.
                break;
            }
        }

        matches.extend_from_slice(heap.committed());
    }

    /// Iterate over the indexed points in ascending rank order.
    pub fn iter(&self) -> impl Iterator<Item = &Point> + ExactSizeIterator {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Exclusive upper bound for a cascaded search: one past the bracket end,
/// clamped so the sentinel row stays inside the destination shard.
fn slack(bracket_end: u32, len: usize) -> usize {
    (bracket_end as usize + 1).min(len)
}

/// Mutable scratch state for one query.
///
/// Owns the match list and the bounded heap used during the mipmap descent.
/// A `Search` may be reused across queries to avoid reallocation, but it
/// serves one query at a time; sharing an index across threads wants one
/// scratch per thread.
#[derive(Default)]
pub struct Search {
    matches: Vec<u32>,
    heap: RankHeap,
}

/// Reference linear-tier size: the count of globally best-ranked points
/// kept in the flat vector-scannable arrays. A multiple of 8.
const LINEAR_LEN: usize = 2048;

/// Reference first-bucket size, chosen so the last level lands as close to
/// the growth factor as possible on the workloads this was tuned against.
const BUCKET_BASE: usize = 3050;

/// Reference geometric growth factor between bucket sizes.
const GROWTH: usize = 3;
