use std::future::Future;
use iced::Executor;
use iced_futures::MaybeSend;
use tokio::runtime::{Builder, Runtime};

/// Runs commands and subscriptions on a multi-threaded tokio runtime, so that btleplug calls never
/// block the event loop.
pub struct MyExecutor {
    runtime: Runtime,
}

impl Executor for MyExecutor {
    fn new() -> Result<Self, futures::io::Error> {
        let runtime = Builder::new_multi_thread()
            .enable_all()
            .thread_name("ble-debugger-worker")
            .build()?;

        Ok(MyExecutor { runtime })
    }

    fn spawn(&self, future: impl Future<Output = ()> + MaybeSend + 'static) {
        // the task is detached; its result is delivered through a message
        let _ = self.runtime.spawn(future);
    }

    fn enter<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.runtime.enter();
        f()
    }
}
