use std::time::Duration;

use crossbeam::channel::{self, Receiver};

/// Read-only handle on a pool's failure stream.
///
/// Every value is the error returned by some task, in the order workers
/// pushed them. The stream closes once the pool's intake is closed and
/// every worker has exited; after that `recv` returns `None`.
///
/// Handles are cheap to clone. Each failure is delivered to exactly one
/// handle.
#[derive(Debug)]
pub struct Results<E> {
    rx: Receiver<E>,
}

impl<E> Results<E> {
    pub(crate) fn new(rx: Receiver<E>) -> Self {
        Results { rx }
    }

    /// Blocks until a failure arrives. Returns `None` once the stream is
    /// closed and drained.
    pub fn recv(&self) -> Option<E> {
        self.rx.recv().ok()
    }

    /// Returns a failure only if a worker is pushing one right now.
    pub fn try_recv(&self) -> Option<E> {
        self.rx.try_recv().ok()
    }

    /// Like [`recv`](Results::recv), but gives up after `timeout`.
    ///
    /// `None` means either the timeout elapsed or the stream is closed;
    /// use [`recv`](Results::recv) to tell them apart.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<E> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// A blocking iterator that ends when the stream closes.
    pub fn iter(&self) -> channel::Iter<'_, E> {
        self.rx.iter()
    }
}

impl<E> Clone for Results<E> {
    fn clone(&self) -> Self {
        Results {
            rx: self.rx.clone(),
        }
    }
}

impl<E> IntoIterator for Results<E> {
    type Item = E;
    type IntoIter = channel::IntoIter<E>;

    fn into_iter(self) -> Self::IntoIter {
        self.rx.into_iter()
    }
}

impl<'a, E> IntoIterator for &'a Results<E> {
    type Item = E;
    type IntoIter = channel::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.rx.iter()
    }
}
