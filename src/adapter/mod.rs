//! `Stream` adapters and the random draws used to impair traffic.

use crate::priv_prelude::*;

mod loss;

pub use self::loss::Loss;

/// Draws a duration uniformly from `[0, max)`. Returns zero if `max` is zero.
pub(crate) fn uniform_duration<R>(
    max: Duration,
    rng: &mut R,
) -> Duration
where
    R: Rng,
{
    if max.is_zero() {
        return Duration::ZERO;
    }
    rng.gen_range(Duration::ZERO..max)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn uniform_duration_stays_in_window() {
        let mut rng = StdRng::seed_from_u64(7);
        let max = Duration::from_millis(300);
        let draws: Vec<Duration> = (0..10_000).map(|_| uniform_duration(max, &mut rng)).collect();
        assert!(draws.iter().all(|draw| *draw < max));

        let mean = draws.iter().map(|draw| draw.as_secs_f64()).sum::<f64>() / draws.len() as f64;
        assert!((mean - 0.15).abs() < 0.01);
    }

    #[test]
    fn uniform_duration_of_zero_window_is_zero() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(uniform_duration(Duration::ZERO, &mut rng), Duration::ZERO);
    }
}
