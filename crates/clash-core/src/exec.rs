// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Serial and parallel execution of narrowphase work.
//!
//! Workers claim fixed-size chunks of the item list through an atomic
//! counter (work stealing). Chunks are contiguous so the scheduler's
//! locality survives. Each worker owns its accumulator; callers merge the
//! returned partials canonically, so the result does not depend on which
//! worker ran which chunk.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::error::{ClashError, Result};

/// Items per claimed chunk.
pub const DEFAULT_CHUNK: usize = 16;

/// Serial baseline: runs `work` over every item with one accumulator.
pub fn execute_serial<T, A>(
    items: &[T],
    mut acc: A,
    mut work: impl FnMut(&mut A, &T) -> Result<()>,
) -> Result<A> {
    for item in items {
        work(&mut acc, item)?;
    }
    Ok(acc)
}

/// Runs `work` over `items` on `workers` scoped threads.
///
/// Returns one accumulator per worker, in worker order. On failure the
/// error of the lowest failing chunk is returned and remaining chunks are
/// abandoned. A worker panic is resumed on the calling thread.
pub fn execute_parallel<T, A>(
    items: &[T],
    workers: usize,
    chunk: usize,
    init: impl Fn() -> A + Sync,
    work: impl Fn(&mut A, &T) -> Result<()> + Sync,
) -> Result<Vec<A>>
where
    T: Sync,
    A: Send,
{
    let chunk = chunk.max(1);
    let chunks = items.len().div_ceil(chunk);
    let workers = workers.max(1).min(chunks.max(1));
    if workers == 1 {
        return execute_serial(items, init(), &work).map(|acc| vec![acc]);
    }

    let next_chunk = AtomicUsize::new(0);
    let failed = AtomicBool::new(false);
    let first_error: Mutex<Option<(usize, ClashError)>> = Mutex::new(None);

    let partials = std::thread::scope(|s| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let next_chunk = &next_chunk;
                let failed = &failed;
                let first_error = &first_error;
                let init = &init;
                let work = &work;
                s.spawn(move || {
                    let mut acc = init();
                    loop {
                        if failed.load(Ordering::Relaxed) {
                            break;
                        }
                        let id = next_chunk.fetch_add(1, Ordering::Relaxed);
                        if id >= chunks {
                            break;
                        }
                        let end = ((id + 1) * chunk).min(items.len());
                        let outcome = items[id * chunk..end]
                            .iter()
                            .try_for_each(|item| work(&mut acc, item));
                        if let Err(e) = outcome {
                            failed.store(true, Ordering::Relaxed);
                            let mut slot = first_error.lock().unwrap_or_else(PoisonError::into_inner);
                            if slot.as_ref().is_none_or(|(at, _)| id < *at) {
                                *slot = Some((id, e));
                            }
                            break;
                        }
                    }
                    acc
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| match h.join() {
                Ok(acc) => acc,
                Err(e) => std::panic::resume_unwind(e),
            })
            .collect::<Vec<_>>()
    });

    match first_error.into_inner().unwrap_or_else(PoisonError::into_inner) {
        Some((_, e)) => Err(e),
        None => Ok(partials),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ConfigError;

    #[test]
    fn every_item_is_processed_once() {
        let items: Vec<u64> = (1..=1000).collect();
        for workers in [1, 2, 7] {
            let partials = execute_parallel(&items, workers, 8, Vec::new, |acc, x| {
                acc.push(*x);
                Ok(())
            })
            .unwrap();
            let mut all: Vec<u64> = partials.into_iter().flatten().collect();
            all.sort_unstable();
            assert_eq!(all, items);
        }
    }

    #[test]
    fn errors_propagate() {
        let items: Vec<u32> = (0..100).collect();
        let result = execute_parallel(&items, 4, 4, || (), |(), x| {
            if *x == 42 {
                Err(ConfigError::Invalid("boom".into()).into())
            } else {
                Ok(())
            }
        });
        assert!(matches!(result, Err(ClashError::Config(_))));
    }

    #[test]
    fn empty_input_yields_one_partial() {
        let partials = execute_parallel(&[] as &[u8], 8, 4, || 0_usize, |_, _| Ok(())).unwrap();
        assert_eq!(partials, vec![0]);
    }
}
