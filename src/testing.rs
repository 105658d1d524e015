// Test doubles: an in-memory cloud that records every call made against it,
// and a terminal that replays scripted answers.

use crate::backend::{Backend, Handle, ObjectStorage, TableSpec, TableStore};
use crate::config::Credentials;
use crate::error::{Error, Result};
use crate::prompt::Terminal;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum CreateMode {
    #[default]
    Normal,
    /// Someone else creates the table between our list and our create.
    Race,
    Fail,
}

#[derive(Default)]
pub struct FakeCloud {
    buckets: RefCell<Vec<String>>,
    tables: RefCell<Vec<String>>,
    calls: RefCell<Vec<(&'static str, String)>>,
    credentials: RefCell<Option<Credentials>>,
    spec: RefCell<Option<TableSpec>>,
    create_mode: RefCell<CreateMode>,
}

impl FakeCloud {
    fn record(&self, op: &'static str, arg: &str) {
        self.calls.borrow_mut().push((op, arg.to_string()));
    }

    pub fn count(&self, op: &str) -> usize {
        self.calls.borrow().iter().filter(|(o, _)| *o == op).count()
    }

    pub fn calls_to(&self, op: &str) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter(|(o, _)| *o == op)
            .map(|(_, arg)| arg.clone())
            .collect()
    }

    pub fn last_credentials(&self) -> Option<Credentials> {
        self.credentials.borrow().clone()
    }

    pub fn last_spec(&self) -> Option<TableSpec> {
        *self.spec.borrow()
    }
}

#[derive(Clone, Default)]
pub struct FakeBackend {
    cloud: Rc<FakeCloud>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_buckets(self, names: &[&str]) -> Self {
        self.cloud
            .buckets
            .borrow_mut()
            .extend(names.iter().map(|n| n.to_string()));
        self
    }

    pub fn with_tables(self, names: &[&str]) -> Self {
        self.cloud
            .tables
            .borrow_mut()
            .extend(names.iter().map(|n| n.to_string()));
        self
    }

    pub fn racing_creates(self) -> Self {
        *self.cloud.create_mode.borrow_mut() = CreateMode::Race;
        self
    }

    pub fn failing_creates(self) -> Self {
        *self.cloud.create_mode.borrow_mut() = CreateMode::Fail;
        self
    }

    pub fn cloud(&self) -> &FakeCloud {
        &self.cloud
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct FakeHandle(String);

impl Handle for FakeHandle {
    fn name(&self) -> &str {
        &self.0
    }
}

pub struct FakeStorage(Rc<FakeCloud>);
pub struct FakeTables(Rc<FakeCloud>);

impl std::fmt::Debug for FakeStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FakeStorage")
    }
}

impl std::fmt::Debug for FakeTables {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FakeTables")
    }
}

impl Backend for FakeBackend {
    type Storage = FakeStorage;
    type Tables = FakeTables;

    fn connect_storage(&self, credentials: &Credentials, region: &str) -> Result<FakeStorage> {
        self.cloud.record("connect_storage", region);
        *self.cloud.credentials.borrow_mut() = Some(credentials.clone());
        Ok(FakeStorage(Rc::clone(&self.cloud)))
    }

    fn connect_tables(&self, credentials: &Credentials, region: &str) -> Result<FakeTables> {
        self.cloud.record("connect_tables", region);
        *self.cloud.credentials.borrow_mut() = Some(credentials.clone());
        Ok(FakeTables(Rc::clone(&self.cloud)))
    }
}

impl ObjectStorage for FakeStorage {
    type Bucket = FakeHandle;

    fn list_buckets(&self) -> Result<Vec<String>> {
        self.0.record("list_buckets", "");
        Ok(self.0.buckets.borrow().clone())
    }

    fn get_bucket(&self, name: &str) -> Result<FakeHandle> {
        self.0.record("get_bucket", name);
        if self.0.buckets.borrow().iter().any(|b| b == name) {
            Ok(FakeHandle(name.to_string()))
        } else {
            Err(Error::service("HeadBucket", format!("no such bucket {}", name)))
        }
    }

    fn create_bucket(&self, name: &str) -> Result<FakeHandle> {
        self.0.record("create_bucket", name);
        if self.0.buckets.borrow().iter().any(|b| b == name) {
            return Err(Error::service("CreateBucket", "BucketAlreadyOwnedByYou"));
        }
        self.0.buckets.borrow_mut().push(name.to_string());
        Ok(FakeHandle(name.to_string()))
    }
}

impl TableStore for FakeTables {
    type Table = FakeHandle;

    fn list_tables(&self) -> Result<Vec<String>> {
        self.0.record("list_tables", "");
        Ok(self.0.tables.borrow().clone())
    }

    fn get_table(&self, name: &str) -> Result<FakeHandle> {
        self.0.record("get_table", name);
        if self.0.tables.borrow().iter().any(|t| t == name) {
            Ok(FakeHandle(name.to_string()))
        } else {
            Err(Error::service("DescribeTable", format!("no such table {}", name)))
        }
    }

    fn create_table(&self, name: &str, spec: &TableSpec) -> Result<FakeHandle> {
        self.0.record("create_table", name);
        *self.0.spec.borrow_mut() = Some(*spec);
        let mode = *self.0.create_mode.borrow();
        match mode {
            CreateMode::Fail => Err(Error::service("CreateTable", "LimitExceededException")),
            CreateMode::Race => {
                self.0.tables.borrow_mut().push(name.to_string());
                Err(Error::TableExists(name.to_string()))
            }
            CreateMode::Normal => {
                if self.0.tables.borrow().iter().any(|t| t == name) {
                    return Err(Error::TableExists(name.to_string()));
                }
                self.0.tables.borrow_mut().push(name.to_string());
                Ok(FakeHandle(name.to_string()))
            }
        }
    }
}

/// Terminal that replays canned answers and records what was shown.
#[derive(Default)]
pub struct ScriptedTerminal {
    secrets: RefCell<VecDeque<String>>,
    answers: RefCell<VecDeque<String>>,
    said: RefCell<Vec<String>>,
    asked: RefCell<Vec<String>>,
    secret_prompts: RefCell<Vec<String>>,
}

impl ScriptedTerminal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn secrets(self, values: &[&str]) -> Self {
        self.secrets
            .borrow_mut()
            .extend(values.iter().map(|v| v.to_string()));
        self
    }

    pub fn answers(self, values: &[&str]) -> Self {
        self.answers
            .borrow_mut()
            .extend(values.iter().map(|v| v.to_string()));
        self
    }

    pub fn said(&self) -> Vec<String> {
        self.said.borrow().clone()
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.borrow().clone()
    }

    pub fn secrets_asked(&self) -> usize {
        self.secret_prompts.borrow().len()
    }
}

impl Terminal for ScriptedTerminal {
    fn say(&self, line: &str) -> Result<()> {
        self.said.borrow_mut().push(line.to_string());
        Ok(())
    }

    fn secret(&self, prompt: &str) -> Result<String> {
        self.secret_prompts.borrow_mut().push(prompt.to_string());
        self.secrets
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| Error::Prompt(unexpected(prompt)))
    }

    fn ask(&self, prompt: &str) -> Result<String> {
        self.asked.borrow_mut().push(prompt.to_string());
        self.answers
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| Error::Prompt(unexpected(prompt)))
    }
}

fn unexpected(prompt: &str) -> std::io::Error {
    std::io::Error::new(
        std::io::ErrorKind::UnexpectedEof,
        format!("no scripted answer for {:?}", prompt),
    )
}
