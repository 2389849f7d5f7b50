use std::future::Future;
use std::thread;
use log::{error, warn};
use tokio::sync::{mpsc, oneshot};

use crate::error::error_msgbox;

struct DialogRequest {
    message: &'static str,
    error: String,
    closed: oneshot::Sender<()>,
}

/// Shows error dialogs one after another on a single thread. The message box is backed by GTK
/// on linux, which must always be called from the thread that initialised it.
#[derive(Debug, Clone)]
pub struct ErrorDialogs {
    // None if the dialog thread could not be started
    requests: Option<mpsc::UnboundedSender<DialogRequest>>,
}

impl ErrorDialogs {
    pub fn start() -> Self {
        Self::start_with(|message, error| error_msgbox(message, &error))
    }

    fn start_with<F>(show: F) -> Self
    where
        F: Fn(&str, &str) + Send + 'static,
    {
        let (requests, mut receiver) = mpsc::unbounded_channel::<DialogRequest>();

        let spawned = thread::Builder::new()
            .name("error-dialog".to_string())
            .spawn(move || {
                while let Some(request) = receiver.blocking_recv() {
                    show(request.message, &request.error);
                    // the waiting side may be gone if the application is closing
                    let _ = request.closed.send(());
                }
            });

        match spawned {
            Ok(_) => ErrorDialogs { requests: Some(requests) },
            Err(err) => {
                error!("Failed to start error dialog thread: {:?}", err);
                ErrorDialogs { requests: None }
            },
        }
    }

    /// Queue a dialog; the returned future resolves once the user has closed it.
    pub fn show(&self, message: &'static str, error: String) -> impl Future<Output = ()> + 'static {
        let (closed, wait) = oneshot::channel();
        let request = DialogRequest { message, error, closed };

        let delivered = match &self.requests {
            Some(requests) => match requests.send(request) {
                Ok(()) => true,
                Err(mpsc::error::SendError(request)) => {
                    warn!("Error dialog thread is gone; {}: {}", request.message, request.error);
                    false
                },
            },
            None => {
                warn!("No error dialog available; {}: {}", request.message, request.error);
                false
            },
        };

        async move {
            if delivered && wait.await.is_err() {
                warn!("Error dialog thread stopped before the dialog was closed");
            }
        }
    }
}
