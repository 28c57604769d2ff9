use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use rect_rank::{Point, RankIndex, Rect, Search};

fn main() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut ranks = (0..100_000).collect::<Vec<_>>();
    ranks.shuffle(&mut rng);
    let points = ranks
        .into_iter()
        .map(|rank| Point {
            id: 0,
            rank,
            x: rng.gen(),
            y: rng.gen(),
        })
        .collect::<Vec<_>>();

    let index = RankIndex::new(&points);
    let mut search = Search::default();

    let rect = Rect::new(0.4, 0.4, 0.6, 0.6);
    println!("10 best-ranked points in [0.4, 0.6] x [0.4, 0.6]:");
    for p in index.search(&rect, 10, &mut search) {
        println!("  rank {:>6} at ({:.4}, {:.4})", p.rank, p.x, p.y);
    }
}
