use rand::rngs::{StdRng, ThreadRng};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use rect_rank::{Point, RankIndex, Rect, Search};

fn point(rank: i32, x: f32, y: f32) -> Point {
    Point { id: 0, rank, x, y }
}

fn ranks(index: &RankIndex, rect: Rect, count: usize) -> Vec<i32> {
    let mut search = Search::default();
    index
        .search(&rect, count, &mut search)
        .map(|p| p.rank)
        .collect()
}

/// Brute force: filter, sort by rank, take k.
fn oracle(points: &[Point], rect: &Rect, k: usize) -> Vec<i32> {
    let mut inside = points
        .iter()
        .filter(|p| rect.contains(p.x, p.y))
        .map(|p| p.rank)
        .collect::<Vec<_>>();
    inside.sort_unstable();
    inside.truncate(k);
    inside
}

fn random_points(rng: &mut StdRng, n: usize) -> Vec<Point> {
    let mut ranks = (0..n as i32).collect::<Vec<_>>();
    ranks.shuffle(rng);
    ranks
        .into_iter()
        .map(|rank| point(rank, rng.gen(), rng.gen()))
        .collect()
}

#[test]
fn four_point_scenarios() {
    let points = [
        point(10, 0.0, 0.0),
        point(5, 1.0, 1.0),
        point(20, 2.0, 2.0),
        point(1, 3.0, 3.0),
    ];
    let index = RankIndex::new(&points);

    // Edges are inclusive, so the rank-20 point sitting exactly on the
    // (2, 2) corner belongs to the result; shrink the rectangle and it
    // drops out.
    assert_eq!(ranks(&index, Rect::new(0.0, 0.0, 2.0, 2.0), 10), [5, 10, 20]);
    assert_eq!(ranks(&index, Rect::new(0.0, 0.0, 1.5, 1.5), 10), [5, 10]);

    assert_eq!(ranks(&index, Rect::new(-10.0, -10.0, 10.0, 10.0), 2), [1, 5]);
    assert_eq!(ranks(&index, Rect::new(5.0, 5.0, 10.0, 10.0), 5), [] as [i32; 0]);
}

#[test]
fn edges_are_inclusive() {
    let points = [
        point(1, 0.0, 0.5), // on lx
        point(2, 1.0, 0.5), // on hx
        point(3, 0.5, 0.0), // on ly
        point(4, 0.5, 1.0), // on hy
        point(5, 0.5, 0.5),
        point(6, 1.5, 0.5), // outside
    ];
    let index = RankIndex::new(&points);
    assert_eq!(ranks(&index, Rect::new(0.0, 0.0, 1.0, 1.0), 10), [1, 2, 3, 4, 5]);
}

#[test]
fn single_point_rect_returns_coincident_points() {
    let points = [
        point(3, 0.5, 0.5),
        point(1, 0.5, 0.5),
        point(2, 0.5, 0.5),
        point(4, 0.6, 0.5),
    ];
    let index = RankIndex::new(&points);
    assert_eq!(ranks(&index, Rect::new(0.5, 0.5, 0.5, 0.5), 10), [1, 2, 3]);
    assert_eq!(ranks(&index, Rect::new(0.5, 0.5, 0.5, 0.5), 2), [1, 2]);
}

#[test]
fn whole_plane_returns_everything_in_rank_order() {
    // 5000 points spans the linear tier and the mipmap, so full retrieval
    // crosses the tier boundary.
    let mut rng = StdRng::seed_from_u64(3);
    let points = random_points(&mut rng, 5000);
    let index = RankIndex::new(&points);
    let everything = Rect::new(f32::MIN, f32::MIN, f32::MAX, f32::MAX);
    assert_eq!(ranks(&index, everything, 9000), (0..5000).collect::<Vec<_>>());
}

#[test]
fn inverted_rect_matches_nothing() {
    let points = [point(1, 0.5, 0.5), point(2, 0.6, 0.6)];
    let index = RankIndex::new(&points);
    assert_eq!(ranks(&index, Rect::new(1.0, 1.0, 0.0, 0.0), 5), [] as [i32; 0]);
}

#[test]
fn nan_rect_matches_nothing() {
    let points = [point(1, 0.5, 0.5)];
    let index = RankIndex::new(&points);
    assert_eq!(ranks(&index, Rect::new(f32::NAN, 0.0, 1.0, 1.0), 5), [] as [i32; 0]);
    assert_eq!(ranks(&index, Rect::new(0.0, 0.0, f32::NAN, 1.0), 5), [] as [i32; 0]);
}

#[test]
fn nan_points_are_dropped() {
    let points = [
        point(1, f32::NAN, 0.5),
        point(2, 0.5, f32::NAN),
        point(3, 0.5, 0.5),
    ];
    let index = RankIndex::new(&points);
    assert_eq!(index.len(), 1);
    assert_eq!(ranks(&index, Rect::new(0.0, 0.0, 1.0, 1.0), 5), [3]);
}

#[test]
fn empty_engine() {
    let index = RankIndex::new(&[]);
    assert!(index.is_empty());
    assert_eq!(ranks(&index, Rect::new(0.0, 0.0, 1.0, 1.0), 5), [] as [i32; 0]);
}

#[test]
fn count_zero_returns_nothing() {
    let points = [point(1, 0.5, 0.5)];
    let index = RankIndex::new(&points);
    assert_eq!(ranks(&index, Rect::new(0.0, 0.0, 1.0, 1.0), 0), [] as [i32; 0]);
}

#[test]
fn count_beyond_matches_returns_all_matches() {
    let mut rng = StdRng::seed_from_u64(5);
    let points = random_points(&mut rng, 3000);
    let index = RankIndex::new(&points);
    let rect = Rect::new(0.1, 0.1, 0.4, 0.4);
    assert_eq!(ranks(&index, rect, usize::MAX), oracle(&points, &rect, usize::MAX));
}

#[test]
fn small_input_is_all_linear_tier() {
    // Below the linear-tier size the mipmap is empty and queries still
    // answer correctly.
    let mut rng = StdRng::seed_from_u64(8);
    let points = random_points(&mut rng, 100);
    let index = RankIndex::new(&points);
    let rect = Rect::new(0.2, 0.2, 0.8, 0.8);
    assert_eq!(ranks(&index, rect, 10), oracle(&points, &rect, 10));
}

#[test]
fn duplicate_ranks_are_deterministic() {
    let points = [
        point(7, 0.1, 0.1),
        point(7, 0.2, 0.2),
        point(7, 0.3, 0.3),
        point(1, 0.4, 0.4),
    ];
    let index = RankIndex::new(&points);
    let rect = Rect::new(0.0, 0.0, 1.0, 1.0);
    let first = ranks(&index, rect, 2);
    assert_eq!(first, [1, 7]);
    assert_eq!(first, ranks(&index, rect, 2));
}

#[test]
fn same_scratch_serves_repeated_queries() {
    let mut rng = StdRng::seed_from_u64(21);
    let points = random_points(&mut rng, 4000);
    let index = RankIndex::new(&points);
    let mut search = Search::default();

    let rect = Rect::new(0.25, 0.25, 0.75, 0.75);
    let first = index
        .search(&rect, 20, &mut search)
        .map(|p| p.rank)
        .collect::<Vec<_>>();
    for _ in 0..3 {
        let again = index
            .search(&rect, 20, &mut search)
            .map(|p| p.rank)
            .collect::<Vec<_>>();
        assert_eq!(first, again);
    }
}

#[test]
fn random_against_oracle() {
    let seed = ThreadRng::default().gen::<u64>();
    println!("random_against_oracle (seed = {seed})");
    let mut rng = StdRng::seed_from_u64(seed);

    let points = random_points(&mut rng, 10_000);
    let index = RankIndex::new(&points);
    let rect = Rect::new(0.25, 0.25, 0.75, 0.75);
    assert_eq!(ranks(&index, rect, 20), oracle(&points, &rect, 20));
}

#[test]
fn deep_mipmap_against_oracle() {
    // Tiny buckets force many levels, so every query runs the cascaded
    // bracketing across the whole chain.
    let seed = ThreadRng::default().gen::<u64>();
    println!("deep_mipmap_against_oracle (seed = {seed})");
    let mut rng = StdRng::seed_from_u64(seed);

    let points = random_points(&mut rng, 5000);
    let index = RankIndex::builder()
        .linear_len(16)
        .bucket_base(8)
        .growth(2)
        .build(&points);

    for _ in 0..200 {
        let (x0, x1) = (rng.gen::<f32>(), rng.gen::<f32>());
        let (y0, y1) = (rng.gen::<f32>(), rng.gen::<f32>());
        let rect = Rect::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1));
        let k = rng.gen_range(1..64);
        assert_eq!(ranks(&index, rect, k), oracle(&points, &rect, k));
    }
}

#[test]
fn random_stress() {
    let seed = ThreadRng::default().gen::<u64>();
    println!("random_stress (seed = {seed})");
    let mut rng = StdRng::seed_from_u64(seed);

    let points = random_points(&mut rng, 100_000);
    let index = RankIndex::new(&points);
    let mut search = Search::default();

    for _ in 0..400 {
        let (x0, x1) = (rng.gen::<f32>(), rng.gen::<f32>());
        let (y0, y1) = (rng.gen::<f32>(), rng.gen::<f32>());
        let rect = Rect::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1));
        let k = rng.gen_range(1..100);

        let got = index
            .search(&rect, k, &mut search)
            .map(|p| p.rank)
            .collect::<Vec<_>>();
        assert!(got.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(got, oracle(&points, &rect, k));
    }
}
