use rayon::prelude::*;
use thiserror::Error;

use morpher_image::Image;

use crate::interpolation::grid::CoordinateMap;

/// Errors that can occur during parallel execution.
#[derive(Error, Debug, PartialEq)]
pub enum ParallelError {
    /// The thread pool failed to build.
    #[error("failed to build thread pool: {0}")]
    BuildError(String),

    /// The requested thread count is invalid.
    #[error("thread count must be > 0, got {0}")]
    InvalidThreadCount(usize),

    /// The row stride must be valid.
    #[error("row stride must be > 0, got {0}")]
    InvalidRowStride(usize),
}

/// Controls how row-wise operations are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStrategy {
    /// Use the global Rayon thread pool to process rows in parallel.
    #[default]
    ParallelRows,

    /// Run sequentially on the current thread.
    ///
    /// Useful for small images, debugging, or when the overhead of parallelization
    /// outweighs the benefits.
    Serial,

    /// Run on a local thread pool with `n` threads.
    ///
    /// # Warning
    /// Creates a new thread pool on every call, which has significant overhead.
    /// Use this primarily for benchmarking or specific isolation needs.
    Fixed(usize),
}

/// Apply a fallible function to every row of a buffer with the given strategy.
///
/// The closure receives the row index and the mutable row slice of length
/// `row_stride`. The first error observed stops the remaining rows.
///
/// # Arguments
///
/// * `strategy` - The execution strategy.
/// * `data` - The buffer to process, made of contiguous rows.
/// * `row_stride` - The number of elements per row (width * channels).
/// * `op` - The operation to apply to each row.
pub fn for_each_row<T, E, F>(
    strategy: ExecutionStrategy,
    data: &mut [T],
    row_stride: usize,
    op: F,
) -> Result<(), E>
where
    T: Send,
    E: Send + From<ParallelError>,
    F: Fn(usize, &mut [T]) -> Result<(), E> + Send + Sync,
{
    if row_stride == 0 {
        return Err(ParallelError::InvalidRowStride(row_stride).into());
    }

    match strategy {
        ExecutionStrategy::Serial => data
            .chunks_exact_mut(row_stride)
            .enumerate()
            .try_for_each(|(row, chunk)| op(row, chunk)),
        ExecutionStrategy::ParallelRows => data
            .par_chunks_exact_mut(row_stride)
            .enumerate()
            .try_for_each(|(row, chunk)| op(row, chunk)),
        ExecutionStrategy::Fixed(n) => {
            if n == 0 {
                return Err(ParallelError::InvalidThreadCount(n).into());
            }
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| ParallelError::BuildError(e.to_string()))?;

            pool.install(|| {
                data.par_chunks_exact_mut(row_stride)
                    .enumerate()
                    .try_for_each(|(row, chunk)| op(row, chunk))
            })
        }
    }
}

/// Apply a function to each pixel in the image in parallel with two values.
pub fn par_iter_rows_val_two<T1, T2, T3, const C: usize>(
    src1: &Image<T1, C>,
    src2: &Image<T2, C>,
    dst: &mut Image<T3, C>,
    f: impl Fn(&T1, &T2, &mut T3) + Send + Sync,
) where
    T1: Sync,
    T2: Sync,
    T3: Send,
{
    let stride = (C * src1.cols()).max(1);
    src1.as_slice()
        .par_chunks_exact(stride)
        .zip(src2.as_slice().par_chunks_exact(stride))
        .zip(dst.as_slice_mut().par_chunks_exact_mut(stride))
        .for_each(|((src1_chunk, src2_chunk), dst_chunk)| {
            src1_chunk
                .iter()
                .zip(src2_chunk.iter())
                .zip(dst_chunk.iter_mut())
                .for_each(|((src1_pixel, src2_pixel), dst_pixel)| {
                    f(src1_pixel, src2_pixel, dst_pixel);
                });
        });
}

/// Apply a fallible function to each pixel for grid sampling in parallel.
///
/// The destination image and the coordinate map must share their size;
/// the caller checks this.
pub fn par_iter_rows_resample<T, E, const C: usize>(
    dst: &mut Image<T, C>,
    map: &CoordinateMap,
    f: impl Fn(f32, f32, &mut [T]) -> Result<(), E> + Send + Sync,
) -> Result<(), E>
where
    T: Send,
    E: Send,
{
    let cols = dst.cols().max(1);
    dst.as_slice_mut()
        .par_chunks_exact_mut(C * cols)
        .zip(map.map_x().par_chunks_exact(cols))
        .zip(map.map_y().par_chunks_exact(cols))
        .try_for_each(|((dst_chunk, map_x_chunk), map_y_chunk)| {
            dst_chunk
                .chunks_exact_mut(C)
                .zip(map_x_chunk.iter().zip(map_y_chunk.iter()))
                .try_for_each(|(dst_pixel, (&x, &y))| f(x, y, dst_pixel))
        })
}
