//! Running alignment tasks inline or on a pool of worker threads.

use std::any::Any;
use std::collections::VecDeque;
use std::panic;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, error, warn};

use crate::aligner::config::Parallelism;
use crate::errors::AlignError;

/// Capacity of the task queue of the parallel handler. Submitting blocks while the queue is full.
pub const TASK_QUEUE_CAPACITY: usize = 10_000;

/// Runs an algorithm on some input, passing its results to a delegate.
pub trait ExecutionHandler {
    fn execute<A, I, D>(&mut self, algorithm: A, input: I, delegate: D) -> Result<(), AlignError>
    where
        A: FnOnce(I, D) + Send + 'static,
        I: Send + 'static,
        D: Send + 'static;

    /// Block until every submitted task has finished. No tasks can be submitted afterwards.
    ///
    /// A panic in any task is resumed on the calling thread.
    fn wait(&mut self);
}

/// Runs every task immediately on the calling thread.
#[derive(Debug, Default)]
pub struct SequentialExecutionHandler;

impl ExecutionHandler for SequentialExecutionHandler {
    #[inline]
    fn execute<A, I, D>(&mut self, algorithm: A, input: I, delegate: D) -> Result<(), AlignError>
    where
        A: FnOnce(I, D) + Send + 'static,
        I: Send + 'static,
        D: Send + 'static
    {
        algorithm(input, delegate);
        Ok(())
    }

    fn wait(&mut self) { }
}

type Task = Box<dyn FnOnce() + Send + 'static>;

/// Distributes tasks over a fixed number of worker threads through a bounded queue.
///
/// Tasks run in no particular order. Dropping the handler waits for all submitted tasks.
pub struct ParallelExecutionHandler {
    sender: Option<Sender<Task>>,

    // Keeps the queue open when there are no workers
    receiver: Option<Receiver<Task>>,

    workers: Vec<JoinHandle<()>>,
}

impl ParallelExecutionHandler {
    pub fn new(threads: usize) -> Self {
        let (sender, receiver) = crossbeam_channel::bounded::<Task>(TASK_QUEUE_CAPACITY);

        if threads == 0 {
            warn!("Parallel execution handler created without worker threads, tasks will never run.");
        }

        let workers = (0..threads)
            .map(|_| {
                let tasks = receiver.clone();
                thread::spawn(move || {
                    while let Ok(task) = tasks.recv() {
                        task();
                    }
                })
            })
            .collect();

        debug!("Started {threads} worker threads.");

        Self {
            sender: Some(sender),
            receiver: Some(receiver),
            workers,
        }
    }

    pub fn num_threads(&self) -> usize {
        self.workers.len()
    }

    fn join_workers(&mut self) -> Option<Box<dyn Any + Send + 'static>> {
        let sender = self.sender.take()?;
        drop(sender);

        let mut first_panic = None;
        for worker in self.workers.drain(..) {
            if let Err(payload) = worker.join() {
                error!("Alignment worker thread panicked.");
                first_panic.get_or_insert(payload);
            }
        }

        // Without workers, queued tasks are discarded
        self.receiver = None;

        first_panic
    }
}

impl ExecutionHandler for ParallelExecutionHandler {
    fn execute<A, I, D>(&mut self, algorithm: A, input: I, delegate: D) -> Result<(), AlignError>
    where
        A: FnOnce(I, D) + Send + 'static,
        I: Send + 'static,
        D: Send + 'static
    {
        let sender = self.sender.as_ref()
            .ok_or(AlignError::HandlerClosed)?;

        sender.send(Box::new(move || algorithm(input, delegate)))
            .map_err(|_| AlignError::HandlerClosed)
    }

    /// Propagates the panic of the first worker that panicked, after all workers have finished.
    fn wait(&mut self) {
        if let Some(payload) = self.join_workers() {
            panic::resume_unwind(payload);
        }
    }
}

impl Drop for ParallelExecutionHandler {
    fn drop(&mut self) {
        let payload = self.join_workers();

        // Never panic while already unwinding
        if let Some(payload) = payload {
            if !thread::panicking() {
                panic::resume_unwind(payload);
            }
        }
    }
}

/// Execution handler chosen at runtime.
pub enum Executor {
    Sequential(SequentialExecutionHandler),
    Parallel(ParallelExecutionHandler),
}

impl Executor {
    pub fn new(parallelism: Parallelism) -> Self {
        match parallelism {
            Parallelism::Sequential => Self::Sequential(SequentialExecutionHandler),
            Parallelism::Parallel { threads } => Self::Parallel(ParallelExecutionHandler::new(threads)),
        }
    }

    pub fn is_parallel(&self) -> bool {
        matches!(self, Self::Parallel(_))
    }
}

impl ExecutionHandler for Executor {
    fn execute<A, I, D>(&mut self, algorithm: A, input: I, delegate: D) -> Result<(), AlignError>
    where
        A: FnOnce(I, D) + Send + 'static,
        I: Send + 'static,
        D: Send + 'static
    {
        match self {
            Self::Sequential(handler) => handler.execute(algorithm, input, delegate),
            Self::Parallel(handler) => handler.execute(algorithm, input, delegate),
        }
    }

    fn wait(&mut self) {
        match self {
            Self::Sequential(handler) => handler.wait(),
            Self::Parallel(handler) => handler.wait(),
        }
    }
}

/// Iterator over the results of an algorithm applied to every input, in input order.
///
/// Each input may produce any number of results. With a sequential executor, inputs are
/// processed lazily one at a time. A parallel executor processes all inputs at once on the first
/// call to `next` and buffers their results.
pub struct AlignmentExecutor<R, In, A>
where
    R: Send + 'static,
    In: Iterator,
{
    inputs: In,
    algorithm: A,
    executor: Executor,
    buffer: VecDeque<R>,
    exhausted: bool,
}

impl<R, In, A> AlignmentExecutor<R, In, A>
where
    R: Send + 'static,
    In: Iterator,
    In::Item: Send + 'static,
    A: Fn(In::Item, &mut dyn FnMut(R)) + Clone + Send + 'static,
{
    pub fn new(inputs: In, algorithm: A, executor: Executor) -> Self {
        Self {
            inputs,
            algorithm,
            executor,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    fn fill_buffer(&mut self) {
        let batch_size = if self.executor.is_parallel() { usize::MAX } else { 1 };
        let (sender, receiver) = crossbeam_channel::unbounded::<(usize, R)>();

        let mut submitted = 0;
        for input in self.inputs.by_ref().take(batch_size) {
            let algorithm = self.algorithm.clone();
            let position = submitted;
            let results = sender.clone();

            let task = move |input: In::Item, results: Sender<(usize, R)>| {
                algorithm(input, &mut |result: R| {
                    // The receiver outlives all tasks of this batch
                    let _ = results.send((position, result));
                });
            };

            if let Err(e) = self.executor.execute(task, input, results) {
                error!("Could not submit alignment task: {e}");
                self.exhausted = true;
                break;
            }

            submitted += 1;
        }

        drop(sender);
        if submitted < batch_size {
            self.exhausted = true;
        }

        if submitted == 0 {
            return;
        }

        if self.executor.is_parallel() {
            self.executor.wait();
        }

        let mut buckets: Vec<Vec<R>> = (0..submitted).map(|_| Vec::new()).collect();
        for (position, result) in receiver.try_iter() {
            buckets[position].push(result);
        }

        self.buffer.extend(buckets.into_iter().flatten());
    }
}

impl<R, In, A> Iterator for AlignmentExecutor<R, In, A>
where
    R: Send + 'static,
    In: Iterator,
    In::Item: Send + 'static,
    A: Fn(In::Item, &mut dyn FnMut(R)) + Clone + Send + 'static,
{
    type Item = R;

    fn next(&mut self) -> Option<Self::Item> {
        while self.buffer.is_empty() && !self.exhausted {
            self.fill_buffer();
        }

        self.buffer.pop_front()
    }
}
