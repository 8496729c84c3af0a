//! Index-based data parallelism over per-vertex and per-atom loops.
//!
//! With the `parallel` feature enabled the helpers fan work out over Rayon's global pool;
//! otherwise they run the same closures serially. Results are always collected in index
//! order, so output never depends on scheduling.

#[cfg(feature = "parallel")]
use rayon::prelude::{IntoParallelIterator, ParallelIterator};

/// Evaluates `f(i)` for every `i` in `0..len` and collects the results in index order.
pub fn map_indexed<T, F>(len: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        (0..len).into_par_iter().map(f).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        (0..len).map(f).collect()
    }
}

/// Fallible variant of [`map_indexed`]; returns one of the errors if any evaluation fails.
pub fn try_map_indexed<T, E, F>(len: usize, f: F) -> Result<Vec<T>, E>
where
    T: Send,
    E: Send,
    F: Fn(usize) -> Result<T, E> + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        (0..len).into_par_iter().map(f).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        (0..len).map(f).collect()
    }
}
