//! Helpers shared by unit tests.

use std::future::Future;
use std::task::{Context, Poll, Waker};

/// Drive a future to completion on the current thread by busy-polling.
pub fn block_on<F: Future>(f: F) -> F::Output {
    let mut cx = Context::from_waker(Waker::noop());
    let mut f = std::pin::pin!(f);
    loop {
        if let Poll::Ready(result) = f.as_mut().poll(&mut cx) {
            return result;
        }
    }
}
