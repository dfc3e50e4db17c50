//! Injectable randomness for random arpeggios and dynamic velocity

/// Source of uniform random integers.
///
/// `fastrand::Rng` implements this; tests substitute a seeded or scripted source.
pub trait RandomSource {
    /// Uniform value in `0..bound`. `bound` is never zero.
    fn below(&mut self, bound: usize) -> usize;

    /// Uniform value in `low..=high`
    fn inclusive(&mut self, low: u8, high: u8) -> u8 {
        if high <= low {
            return low;
        }
        low + self.below((high - low) as usize + 1) as u8
    }

    /// Fisher-Yates shuffle in place
    fn shuffle<T>(&mut self, items: &mut [T])
    where
        Self: Sized,
    {
        for i in (1..items.len()).rev() {
            let j = self.below(i + 1);
            items.swap(i, j);
        }
    }
}

impl RandomSource for fastrand::Rng {
    fn below(&mut self, bound: usize) -> usize {
        self.usize(..bound)
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn below(&mut self, bound: usize) -> usize {
        (**self).below(bound)
    }
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    fn below(&mut self, bound: usize) -> usize {
        (**self).below(bound)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::RandomSource;

    /// Replays a fixed list of draws, each reduced modulo the requested bound
    pub struct Scripted {
        draws: Vec<usize>,
        next: usize,
    }

    impl Scripted {
        pub fn new(draws: &[usize]) -> Self {
            Self { draws: draws.to_vec(), next: 0 }
        }
    }

    impl RandomSource for Scripted {
        fn below(&mut self, bound: usize) -> usize {
            let draw = self.draws[self.next % self.draws.len()];
            self.next += 1;
            draw % bound
        }
    }
}
