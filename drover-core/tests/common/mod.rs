#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashSet;

use drover_core::Source;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[ctor::ctor]
fn init_tests() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// A source that records everything printed to it.
pub struct RecordingSource {
    permissions: HashSet<String>,
    pub printed: RefCell<Vec<String>>,
    pub errors: RefCell<Vec<String>>,
}

impl RecordingSource {
    pub fn new() -> Self {
        Self::with_permissions(&[])
    }

    pub fn with_permissions(permissions: &[&str]) -> Self {
        Self {
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
            printed: RefCell::new(Vec::new()),
            errors: RefCell::new(Vec::new()),
        }
    }

    pub fn last_error(&self) -> Option<String> {
        self.errors.borrow().last().cloned()
    }
}

impl Source for RecordingSource {
    fn has_permission(&self, node: &str) -> bool {
        self.permissions.contains(node)
    }

    fn print(&self, message: &str) {
        self.printed.borrow_mut().push(message.to_string());
    }

    fn print_err(&self, message: &str) {
        self.errors.borrow_mut().push(message.to_string());
    }
}
