use anyhow::Result;
use crossbeam::channel::{Receiver, Sender, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Bounded worker pool over a list of independent work items.
///
/// Items are handed out through a bounded channel; results come back in
/// completion order, never submission order.
pub struct ParallelExecutor<T, R> {
    max_workers: usize,
    _phantom: std::marker::PhantomData<(T, R)>,
}

/// Context for worker threads to avoid too many function parameters
struct WorkerContext<T, R, F, P> {
    worker_id: usize,
    work_rx: Receiver<T>,
    result_tx: Sender<R>,
    progress_counter: Arc<AtomicUsize>,
    total_items: usize,
    processor: Arc<F>,
    on_complete: Option<Arc<P>>,
}

impl<T, R> ParallelExecutor<T, R>
where
    T: Send + Sync + 'static,
    R: Send + Sync + 'static,
{
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
            _phantom: std::marker::PhantomData,
        }
    }

    /// Run every item through `processor` on at most `max_workers` threads.
    ///
    /// `on_complete(result, completed, total)` fires once per item, from the
    /// worker that finished it.
    pub fn execute<F, P>(&self, work_items: Vec<T>, processor: F, on_complete: Option<P>) -> Result<Vec<R>>
    where
        F: Fn(&T, usize) -> R + Send + Sync + 'static,
        P: Fn(&R, usize, usize) + Send + Sync + 'static,
    {
        if work_items.is_empty() {
            return Ok(Vec::new());
        }

        let actual_workers = std::cmp::min(self.max_workers, work_items.len());
        let buffer_size = actual_workers.saturating_mul(2);
        let (work_tx, work_rx): (Sender<T>, Receiver<T>) = bounded(buffer_size);
        let (result_tx, result_rx): (Sender<R>, Receiver<R>) = bounded(buffer_size);

        let progress_counter = Arc::new(AtomicUsize::new(0));
        let total_items = work_items.len();

        let processor = Arc::new(processor);
        let on_complete = on_complete.map(Arc::new);

        tracing::debug!("Starting {} workers for {} items", actual_workers, total_items);

        crossbeam::thread::scope(|s| -> Result<Vec<R>> {
            for worker_id in 0..actual_workers {
                let ctx = WorkerContext {
                    worker_id,
                    work_rx: work_rx.clone(),
                    result_tx: result_tx.clone(),
                    progress_counter: progress_counter.clone(),
                    total_items,
                    processor: processor.clone(),
                    on_complete: on_complete.clone(),
                };

                s.spawn(move |_| self.worker_thread(ctx));
            }

            // Producer: feed the bounded work queue
            let work_tx_clone = work_tx.clone();
            s.spawn(move |_| {
                for work_item in work_items {
                    if work_tx_clone.send(work_item).is_err() {
                        break;
                    }
                }
            });

            drop(work_tx);
            drop(result_tx);

            Ok(self.collect_results(result_rx, total_items))
        })
        .map_err(|_| anyhow::anyhow!("Thread panic occurred during parallel execution"))?
    }

    fn worker_thread<F, P>(&self, ctx: WorkerContext<T, R, F, P>)
    where
        F: Fn(&T, usize) -> R,
        P: Fn(&R, usize, usize),
    {
        while let Ok(work_item) = ctx.work_rx.recv() {
            let result = (ctx.processor)(&work_item, ctx.worker_id);

            let current = ctx.progress_counter.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(ref on_complete) = ctx.on_complete {
                on_complete(&result, current, ctx.total_items);
            }

            if ctx.result_tx.send(result).is_err() {
                break;
            }
        }
        tracing::trace!("Worker {} finished", ctx.worker_id);
    }

    fn collect_results(&self, result_rx: Receiver<R>, total_items: usize) -> Vec<R> {
        let mut results = Vec::with_capacity(total_items);

        while let Ok(result) = result_rx.recv() {
            results.push(result);

            if results.len() >= total_items {
                break;
            }
        }

        results
    }
}

/// Single-threaded fallback with the same callback contract
pub struct SequentialExecutor;

impl SequentialExecutor {
    pub fn execute<T, R, F, P>(work_items: Vec<T>, processor: F, on_complete: Option<P>) -> Vec<R>
    where
        F: Fn(&T, usize) -> R,
        P: Fn(&R, usize, usize),
    {
        let total_items = work_items.len();
        let mut results = Vec::with_capacity(total_items);

        for (index, work_item) in work_items.iter().enumerate() {
            let result = processor(work_item, 0);
            if let Some(on_complete) = &on_complete {
                on_complete(&result, index + 1, total_items);
            }
            results.push(result);
        }

        results
    }
}

/// Execution strategy enum for choosing between parallel and sequential
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStrategy {
    Sequential,
    Parallel { workers: usize },
}

impl ExecutionStrategy {
    pub fn execute<T, R, F, P>(&self, work_items: Vec<T>, processor: F, on_complete: Option<P>) -> Result<Vec<R>>
    where
        T: Send + Sync + 'static,
        R: Send + Sync + 'static,
        F: Fn(&T, usize) -> R + Send + Sync + 'static,
        P: Fn(&R, usize, usize) + Send + Sync + 'static,
    {
        match self {
            ExecutionStrategy::Sequential => Ok(SequentialExecutor::execute(work_items, processor, on_complete)),
            ExecutionStrategy::Parallel { workers } => {
                let executor = ParallelExecutor::new(*workers);
                executor.execute(work_items, processor, on_complete)
            }
        }
    }

    /// Parallel only when there is more than one item and more than one worker
    ///
    /// ```rust
    /// use docbatch::parallel::ExecutionStrategy;
    ///
    /// assert_eq!(ExecutionStrategy::auto(1, 8), ExecutionStrategy::Sequential);
    /// assert_eq!(ExecutionStrategy::auto(20, 1), ExecutionStrategy::Sequential);
    /// assert_eq!(ExecutionStrategy::auto(20, 4), ExecutionStrategy::Parallel { workers: 4 });
    /// ```
    pub fn auto(work_items_count: usize, workers: usize) -> Self {
        if work_items_count > 1 && workers > 1 {
            ExecutionStrategy::Parallel { workers }
        } else {
            ExecutionStrategy::Sequential
        }
    }

    /// Worker count from configuration and available cores
    ///
    /// ```text
    /// jobs > 0   -> jobs
    /// jobs == 0  -> max(1, cores * thread_percentage / 100)
    /// ```
    ///
    /// ```rust
    /// use docbatch::parallel::ExecutionStrategy;
    ///
    /// assert_eq!(ExecutionStrategy::calculate_optimal_workers(3, 50), 3);
    /// assert!(ExecutionStrategy::calculate_optimal_workers(0, 100) >= 1);
    /// ```
    pub fn calculate_optimal_workers(jobs: usize, thread_percentage: u8) -> usize {
        if jobs > 0 {
            return jobs;
        }

        let available_cores = num_cpus::get();
        std::cmp::max(1, (available_cores * thread_percentage as usize) / 100)
    }
}
