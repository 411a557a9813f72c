use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use parking_lot::Mutex;

use dagkube::dag::{BoxFuture, Task, TaskResult};

/// What a `RecordingTask` did, in global order across all tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Started(String),
    Finished(String),
}

#[derive(Debug, Default)]
struct RecorderState {
    events: Vec<Event>,
    running: usize,
    max_running: usize,
}

/// Shared log of task starts/finishes plus a concurrency high-water mark.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    state: Arc<Mutex<RecorderState>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A task that sleeps briefly and succeeds.
    pub fn task(&self, id: &str) -> RecordingTask {
        RecordingTask {
            id: id.to_string(),
            recorder: self.clone(),
            delay: Duration::from_millis(20),
            behaviour: Behaviour::Succeed,
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.lock().events.clone()
    }

    /// Ids in the order their runs started.
    pub fn started(&self) -> Vec<String> {
        self.state
            .lock()
            .events
            .iter()
            .filter_map(|e| match e {
                Event::Started(id) => Some(id.clone()),
                Event::Finished(_) => None,
            })
            .collect()
    }

    /// How many times `id` was started.
    pub fn runs_of(&self, id: &str) -> usize {
        self.state
            .lock()
            .events
            .iter()
            .filter(|e| matches!(e, Event::Started(s) if s == id))
            .count()
    }

    pub fn ran(&self, id: &str) -> bool {
        self.runs_of(id) > 0
    }

    /// `true` if `first` finished before `second` started.
    pub fn finished_before_started(&self, first: &str, second: &str) -> bool {
        let events = self.state.lock().events.clone();
        let finished = events
            .iter()
            .position(|e| matches!(e, Event::Finished(s) if s == first));
        let started = events
            .iter()
            .position(|e| matches!(e, Event::Started(s) if s == second));
        match (finished, started) {
            (Some(f), Some(s)) => f < s,
            _ => false,
        }
    }

    /// Largest number of tasks that were running at the same time.
    pub fn max_concurrency(&self) -> usize {
        self.state.lock().max_running
    }

    fn start(&self, id: &str) {
        let mut state = self.state.lock();
        state.events.push(Event::Started(id.to_string()));
        state.running += 1;
        state.max_running = state.max_running.max(state.running);
    }

    fn finish(&self, id: &str) {
        let mut state = self.state.lock();
        state.events.push(Event::Finished(id.to_string()));
        state.running -= 1;
    }
}

#[derive(Debug, Clone, Copy)]
enum Behaviour {
    Succeed,
    Fail,
    Panic,
}

/// Test task that records its run in a [`Recorder`].
#[derive(Debug, Clone)]
pub struct RecordingTask {
    id: String,
    recorder: Recorder,
    delay: Duration,
    behaviour: Behaviour,
}

impl RecordingTask {
    pub fn delay_ms(mut self, ms: u64) -> Self {
        self.delay = Duration::from_millis(ms);
        self
    }

    pub fn failing(mut self) -> Self {
        self.behaviour = Behaviour::Fail;
        self
    }

    pub fn panicking(mut self) -> Self {
        self.behaviour = Behaviour::Panic;
        self
    }
}

impl Task<String> for RecordingTask {
    fn id(&self) -> &String {
        &self.id
    }

    fn run(&self) -> BoxFuture<'_, TaskResult> {
        Box::pin(async move {
            self.recorder.start(&self.id);
            tokio::time::sleep(self.delay).await;
            self.recorder.finish(&self.id);

            match self.behaviour {
                Behaviour::Succeed => Ok(()),
                Behaviour::Fail => Err(anyhow!("task {} failed on purpose", self.id)),
                Behaviour::Panic => panic!("task {} panicked on purpose", self.id),
            }
        })
    }
}
