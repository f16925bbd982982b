use std::sync::{Arc, Mutex};

use vodpublish::exec::{BoxFuture, Invocation, OutputTarget, ProcessOutcome, ProcessRunner};

type Handler = dyn Fn(&Invocation) -> anyhow::Result<ProcessOutcome> + Send + Sync;

/// A fake process runner that:
/// - records every invocation
/// - creates the output file for `OutputTarget::File`, like a real redirect
/// - delegates the outcome (and any file side effects) to a closure.
#[derive(Clone)]
pub struct FakeRunner {
    handler: Arc<Handler>,
    calls: Arc<Mutex<Vec<Invocation>>>,
}

impl FakeRunner {
    pub fn new<H>(handler: H) -> Self
    where
        H: Fn(&Invocation) -> anyhow::Result<ProcessOutcome> + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every process exits 0 and does nothing else.
    pub fn succeeding() -> Self {
        Self::new(|_| Ok(ProcessOutcome::exited(0)))
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }
}

impl ProcessRunner for FakeRunner {
    fn run(&self, invocation: Invocation) -> BoxFuture<'_, anyhow::Result<ProcessOutcome>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(invocation.clone());
            if let OutputTarget::File(path) = &invocation.output {
                std::fs::write(path, b"")?;
            }
            (self.handler)(&invocation)
        })
    }
}
