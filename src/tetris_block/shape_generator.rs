use rand::{rngs::StdRng, Rng, SeedableRng};

use super::block_shape::Shape;

/// Picks the shape of the next piece to spawn.
pub trait ShapeGenerator {
    fn next_shape(&mut self) -> Shape;
}

/// Uniform draw over every shape.
pub struct RandomGenerator<R: Rng = StdRng> {
    rng: R,
}

impl RandomGenerator<StdRng> {
    pub fn from_entropy() -> Self {
        RandomGenerator {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        RandomGenerator {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> ShapeGenerator for RandomGenerator<R> {
    fn next_shape(&mut self) -> Shape {
        // exclusive upper bound, the index can never reach ALL.len()
        Shape::ALL[self.rng.gen_range(0..Shape::ALL.len())]
    }
}

/// Replays a fixed list of shapes, wrapping around at the end.
#[cfg(test)]
pub struct SequenceGenerator {
    shapes: Vec<Shape>,
    idx: usize,
}

#[cfg(test)]
impl SequenceGenerator {
    pub fn new(shapes: Vec<Shape>) -> Self {
        assert!(!shapes.is_empty());
        SequenceGenerator { shapes, idx: 0 }
    }
}

#[cfg(test)]
impl ShapeGenerator for SequenceGenerator {
    fn next_shape(&mut self) -> Shape {
        let shape = self.shapes[self.idx];
        self.idx = (self.idx + 1) % self.shapes.len();
        shape
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use super::{RandomGenerator, SequenceGenerator, ShapeGenerator};
    use crate::tetris_block::block_shape::Shape;

    #[test]
    fn random_draws_cover_every_shape() {
        let mut generator = RandomGenerator::seeded(20260228);
        let seen: HashSet<Shape> = (0..400).map(|_| generator.next_shape()).collect();
        assert_eq!(seen.len(), Shape::ALL.len());
    }

    #[test]
    fn same_seed_same_stream() {
        let mut a = RandomGenerator::seeded(7);
        let mut b = RandomGenerator::seeded(7);
        for _ in 0..50 {
            assert_eq!(a.next_shape(), b.next_shape());
        }
    }

    #[test]
    fn sequence_wraps() {
        let mut generator = SequenceGenerator::new(vec![Shape::T, Shape::S]);
        let drawn: Vec<_> = (0..5).map(|_| generator.next_shape()).collect();
        assert_eq!(drawn, vec![Shape::T, Shape::S, Shape::T, Shape::S, Shape::T]);
    }
}
