//! Parallel scheduler interface: a single `for_each_parallel` primitive.
//!
//! Backed by `rayon`, mirroring the way the teacher already fans out its own
//! per-directory work with `par_iter` in `commands/spritesheet.rs`. `fn` is
//! invoked exactly once per item, invocations may run concurrently, and the
//! call only returns once every invocation has completed. Errors are
//! collected and the first one is returned after the join.

use rayon::iter::{IntoParallelRefMutIterator as _, ParallelIterator as _};

/// Runs `f` once per item, possibly concurrently, and waits for all of them.
///
/// If any invocation returns `Err`, the first error (in item order) is
/// returned after every invocation has finished; the rest are discarded.
pub fn for_each_parallel<T, E, F>(items: &mut [T], f: F) -> Result<(), E>
where
    T: Send,
    E: Send,
    F: Fn(&mut T) -> Result<(), E> + Sync,
{
    let errors: Vec<E> = items
        .par_iter_mut()
        .filter_map(|item| f(item).err())
        .collect();

    errors.into_iter().next().map_or(Ok(()), Err)
}

/// Variant for infallible work, used by most packing hot spots.
pub fn for_each_parallel_infallible<T, F>(items: &mut [T], f: F)
where
    T: Send,
    F: Fn(&mut T) + Sync,
{
    items.par_iter_mut().for_each(f);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn invokes_every_item_exactly_once() {
        let mut items = vec![1, 2, 3, 4, 5];
        let counter = AtomicUsize::new(0);
        for_each_parallel_infallible(&mut items, |v| {
            *v *= 2;
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(counter.load(Ordering::SeqCst), 5);
        assert_eq!(items, vec![2, 4, 6, 8, 10]);
    }

    #[test]
    fn first_error_wins() {
        let mut items = vec![1, 2, 3];
        let result: Result<(), &'static str> = for_each_parallel(&mut items, |v| {
            if *v == 2 {
                Err("bad item")
            } else {
                Ok(())
            }
        });
        assert_eq!(result, Err("bad item"));
    }
}
