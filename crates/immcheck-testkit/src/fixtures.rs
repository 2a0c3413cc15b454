//! Test fixtures and helpers.
//!
//! Sample value graphs and a log sink shared by the integration tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;
use std::sync::{Arc, Once};
use std::thread;
use std::time::{Duration, Instant};

use immcheck_core::inspect_struct;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::filter::LevelFilter;

/// A struct made only of scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Person {
    pub age: u16,
    pub height: u8,
}

inspect_struct!(Person { age: u16, height: u8 });

/// A struct with text, sequences, a map and an optional box.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub name: String,
    pub tags: Vec<String>,
    pub scores: HashMap<String, u32>,
    pub manager: Option<Box<Person>>,
}

inspect_struct!(Profile {
    name: String,
    tags: Vec<String>,
    scores: HashMap<String, u32>,
    manager: Option<Box<Person>>,
});

/// A node of a linked graph that may contain cycles.
#[derive(Debug)]
pub struct Node {
    pub value: Cell<u32>,
    pub next: RefCell<Option<Rc<Node>>>,
}

inspect_struct!(Node {
    value: Cell<u32>,
    next: RefCell<Option<Rc<Node>>>,
});

impl Node {
    pub fn new(value: u32) -> Rc<Node> {
        Rc::new(Node {
            value: Cell::new(value),
            next: RefCell::new(None),
        })
    }

    pub fn link(&self, next: &Rc<Node>) {
        *self.next.borrow_mut() = Some(Rc::clone(next));
    }
}

/// Nodes linked in a circle. Dropping the ring breaks the links.
pub struct Ring {
    nodes: Vec<Rc<Node>>,
}

impl Ring {
    /// Build a ring of `len` nodes valued `0..len`. A ring of one links to
    /// itself.
    pub fn new(len: usize) -> Self {
        let nodes: Vec<_> = (0..len as u32).map(Node::new).collect();
        for (i, node) in nodes.iter().enumerate() {
            node.link(&nodes[(i + 1) % nodes.len()]);
        }
        Self { nodes }
    }

    pub fn head(&self) -> &Rc<Node> {
        &self.nodes[0]
    }

    pub fn nodes(&self) -> &[Rc<Node>] {
        &self.nodes
    }
}

impl Drop for Ring {
    fn drop(&mut self) {
        for node in &self.nodes {
            node.next.borrow_mut().take();
        }
    }
}

/// A cloneable in-memory writer for capturing mismatch output.
#[derive(Debug, Clone, Default)]
pub struct SharedLog {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl SharedLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.contents().contains(needle)
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.lock().is_empty()
    }
}

impl Write for SharedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Seeded source of sample values.
pub struct TestFixture {
    rng: StdRng,
}

impl TestFixture {
    /// Create a fixture with a random seed.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Create with a deterministic seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn person(&mut self) -> Person {
        Person {
            age: self.rng.gen_range(0..120),
            height: self.rng.gen(),
        }
    }

    pub fn profile(&mut self) -> Profile {
        let tag_count = self.rng.gen_range(0..6);
        let score_count = self.rng.gen_range(0..8);
        Profile {
            name: self.word(),
            tags: (0..tag_count).map(|_| self.word()).collect(),
            scores: (0..score_count)
                .map(|_| (self.word(), self.rng.gen()))
                .collect(),
            manager: self
                .rng
                .gen_bool(0.5)
                .then(|| Box::new(self.person())),
        }
    }

    pub fn word(&mut self) -> String {
        let len = self.rng.gen_range(1..12);
        (0..len)
            .map(|_| char::from(self.rng.gen_range(b'a'..=b'z')))
            .collect()
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Install a test-friendly tracing subscriber once per process.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(LevelFilter::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

/// Poll `condition` until it holds or `timeout` passes.
pub fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(10));
    }
}
