//! Batched fan-out over owned elements.
//!
//! A job splits its buffer into contiguous batches and moves each one into its
//! own task. Nothing inside a task waits on other tasks, so a caller may block
//! on the batches from any thread, including a compute pool worker, as long as
//! the batches were spawned on a different pool.

use bevy::tasks::{block_on, Task, TaskPool};

/// What went wrong with a single element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// The updated transform contained NaN or infinity.
    NonFiniteTransform,
    /// The updated velocity contained NaN or infinity.
    NonFiniteVelocity,
    /// The displaced height was NaN or infinity.
    NonFiniteHeight,
}

/// An element whose update was discarded. The element kept its previous value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementFault {
    pub index: usize,
    pub kind: FaultKind,
}

/// Per-batch counters, merged after the join.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchTally {
    /// Elements visited.
    pub processed: usize,
    /// Elements that took the job's notable branch (escaped swimmers, displaced vertices).
    pub flagged: usize,
    pub faults: Vec<ElementFault>,
}

impl BatchTally {
    pub fn merge(mut self, other: BatchTally) -> BatchTally {
        self.processed += other.processed;
        self.flagged += other.flagged;
        self.faults.extend(other.faults);
        self
    }

    /// Orders faults by element index so reports do not depend on batch timing.
    pub fn finish(mut self) -> BatchTally {
        self.faults.sort_by_key(|fault| fault.index);
        self
    }
}

/// A finished batch, handed back with the elements it owned.
struct Batch<T> {
    items: Vec<T>,
    tally: BatchTally,
}

/// Batches spawned by [`spawn_batches`], in buffer order.
pub struct PendingBatches<T> {
    tasks: Vec<Task<Batch<T>>>,
}

impl<T> PendingBatches<T> {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Blocks on every batch and reassembles the buffer in its original order.
    pub fn join(self) -> (Vec<T>, BatchTally) {
        let mut items = Vec::new();
        let mut tally = BatchTally::default();
        for task in self.tasks {
            let batch = block_on(task);
            items.extend(batch.items);
            tally = tally.merge(batch.tally);
        }
        (items, tally.finish())
    }
}

/// Moves `items` into tasks of at most `batch_size` elements each.
///
/// `run` receives the buffer index of the batch's first element.
pub fn spawn_batches<T, F>(
    pool: &TaskPool,
    mut items: Vec<T>,
    batch_size: usize,
    run: F,
) -> PendingBatches<T>
where
    T: Send + 'static,
    F: Fn(usize, &mut [T]) -> BatchTally + Clone + Send + 'static,
{
    let batch_size = batch_size.max(1);
    let mut tasks = Vec::with_capacity(items.len().div_ceil(batch_size));
    let mut first_index = 0;

    while !items.is_empty() {
        let rest = items.split_off(batch_size.min(items.len()));
        let mut batch = std::mem::replace(&mut items, rest);
        let run = run.clone();
        let start = first_index;
        first_index += batch.len();

        tasks.push(pool.spawn(async move {
            let tally = run(start, &mut batch);
            Batch {
                items: batch,
                tally,
            }
        }));
    }

    PendingBatches { tasks }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doubling(first: usize, chunk: &mut [u32]) -> BatchTally {
        let mut tally = BatchTally::default();
        for (offset, value) in chunk.iter_mut().enumerate() {
            *value *= 2;
            tally.processed += 1;
            if (first + offset) % 100 == 0 {
                tally.faults.push(ElementFault {
                    index: first + offset,
                    kind: FaultKind::NonFiniteHeight,
                });
            }
        }
        tally
    }

    #[test]
    fn test_batches_visit_every_element_in_order() {
        let pool = TaskPool::new();
        let values: Vec<u32> = (0..1000).collect();

        let pending = spawn_batches(&pool, values, 64, doubling);
        assert_eq!(pending.len(), 16);
        let (values, tally) = pending.join();

        assert_eq!(tally.processed, 1000);
        assert!(values.iter().enumerate().all(|(i, v)| *v == 2 * i as u32));
        let indices: Vec<usize> = tally.faults.iter().map(|fault| fault.index).collect();
        assert_eq!(indices, (0..10).map(|i| i * 100).collect::<Vec<_>>());
    }

    #[test]
    fn test_no_batches_for_empty_buffer() {
        let pool = TaskPool::new();
        let pending = spawn_batches(&pool, Vec::<u8>::new(), 8, |_, _| BatchTally::default());
        assert!(pending.is_empty());

        let (items, tally) = pending.join();
        assert!(items.is_empty());
        assert_eq!(tally, BatchTally::default());
    }

    #[test]
    fn test_join_from_single_threaded_pool_worker() {
        let outer = TaskPool::new();
        let inner = bevy::tasks::TaskPoolBuilder::new().num_threads(1).build();

        // Join from inside another pool's task, the way a system thread would
        let (values, tally) = block_on(outer.spawn(async move {
            spawn_batches(&inner, (0..500).collect::<Vec<u32>>(), 7, doubling).join()
        }));

        assert_eq!(tally.processed, 500);
        assert_eq!(values[499], 998);
    }
}
