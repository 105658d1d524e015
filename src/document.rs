// Table-backed documents.
// Each document kind names the table suffix it lives in. A `TableBinding`
// resolves that table through `Config` the first time it's needed and keeps
// it for the lifetime of the binding.

use crate::backend::{Backend, TableOf};
use crate::config::Config;
use crate::error::Result;
use once_cell::unsync::OnceCell;
use std::marker::PhantomData;
use std::rc::Rc;

/// A kind of record stored in its own catalog table.
pub trait Document {
    /// Table suffix; the full name is `{prefix}-{TABLE_NAME}`.
    const TABLE_NAME: &'static str;

    /// Create this document's table. Meant for setup, not for every request.
    fn create<B: Backend>(config: &Config<B>) -> Result<Rc<TableOf<B>>> {
        config.create_table(Self::TABLE_NAME)
    }

    /// Lazily bound table for one document value.
    fn bind<B: Backend>(config: &Config<B>) -> TableBinding<'_, Self, B>
    where
        Self: Sized,
    {
        TableBinding::new(config)
    }
}

/// Tags attached to images.
pub struct Tag;

impl Document for Tag {
    const TABLE_NAME: &'static str = "tag";
}

/// Stored images.
pub struct Image;

impl Document for Image {
    const TABLE_NAME: &'static str = "image";
}

pub struct TableBinding<'c, D: Document, B: Backend> {
    config: &'c Config<B>,
    table: OnceCell<Rc<TableOf<B>>>,
    _document: PhantomData<D>,
}

impl<'c, D: Document, B: Backend> TableBinding<'c, D, B> {
    pub fn new(config: &'c Config<B>) -> Self {
        TableBinding {
            config,
            table: OnceCell::new(),
            _document: PhantomData,
        }
    }

    pub fn table(&self) -> Result<Rc<TableOf<B>>> {
        self.table
            .get_or_try_init(|| self.config.table(D::TABLE_NAME))
            .cloned()
    }
}
