#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use standout_sequence::Sequence;

/// Installs a stderr subscriber filtered by `RUST_LOG`.
///
/// Safe to call from every test; only the first call takes effect.
pub fn init_test_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// A restartable, unseekable source that counts how often it is opened.
pub fn counted_source(items: Vec<i32>) -> (Sequence<'static, i32>, Rc<Cell<usize>>) {
    let opened = Rc::new(Cell::new(0));
    let counter = Rc::clone(&opened);
    let seq = Sequence::from_fn(move || {
        counter.set(counter.get() + 1);
        items.clone()
    });
    (seq, opened)
}
