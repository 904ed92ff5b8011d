//! Registry owning the text-encoder slot and the array record memo table.
//!
//! A [Context] is an explicit, passable value: each one memoizes its own array
//! types and holds its own text encoder. [Context::global] offers a lazily
//! created process-wide instance, and [Context::reset] clears it between
//! tests.
//!
//! Record uids are process-wide regardless of context, so types defined in
//! different contexts never compare equal.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, OnceLock},
};

use log::{debug, trace, warn};
use parking_lot::{Mutex, RwLock};

use crate::{
    accessor::Accessor,
    array,
    data_type::DataType,
    encoding::TextEncoder,
    errors::Result,
    field::ObjectDef,
    object::{self, ResolvedField},
    record::RecordType,
};

static GLOBAL: OnceLock<Context> = OnceLock::new();

#[derive(Default)]
pub struct Context {
    encoder: RwLock<Option<Arc<dyn TextEncoder>>>,
    arrays: Mutex<HashMap<(String, usize), Arc<RecordType>>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text_encoder(encoder: impl TextEncoder + 'static) -> Self {
        let context = Self::new();
        context.set_text_encoder(encoder);
        context
    }

    /// Process-wide context, created on first use with no text encoder.
    pub fn global() -> &'static Context {
        GLOBAL.get_or_init(Context::new)
    }

    /// Installs the text encoder used by record types defined from now on.
    /// Types already defined keep the encoder they captured.
    pub fn set_text_encoder(&self, encoder: impl TextEncoder + 'static) {
        self.set_shared_text_encoder(Arc::new(encoder));
    }

    pub fn set_shared_text_encoder(&self, encoder: Arc<dyn TextEncoder>) {
        let mut slot = self.encoder.write();
        if let Some(previous) = slot.as_ref() {
            warn!("replacing text encoder {previous:?} with {encoder:?}");
        }
        *slot = Some(encoder);
    }

    pub fn clear_text_encoder(&self) {
        self.encoder.write().take();
    }

    pub fn text_encoder(&self) -> Option<Arc<dyn TextEncoder>> {
        self.encoder.read().clone()
    }

    /// Clears the text encoder and forgets every memoized array type.
    pub fn reset(&self) {
        self.clear_text_encoder();
        self.arrays.lock().clear();
    }

    /// Number of memoized array record types.
    pub fn array_cache_len(&self) -> usize {
        self.arrays.lock().len()
    }

    /// Resolves a DataType token to its accessor.
    pub fn resolve(&self, data_type: &DataType) -> Result<Accessor> {
        data_type.resolve()
    }

    /// Compiles an object record type. Every call yields a new type with a
    /// new uid, even for an identical definition.
    pub fn define_object(&self, def: &ObjectDef) -> Result<Arc<RecordType>> {
        let fields = def
            .fields
            .iter()
            .map(|f| -> Result<ResolvedField> {
                Ok(ResolvedField {
                    name: f.name.clone(),
                    accessor: self.resolve(&f.data_type)?,
                    bit_offset: f.bit_offset,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let encoder = self.text_encoder();
        let record = object::compile(&def.name, fields, def.bit_length, encoder.as_ref())?;

        debug!(
            "compiled record {} uid={} bits={} fields={}",
            record.name(),
            record.uid(),
            record.bit_length(),
            record.fields().len()
        );

        Ok(Arc::new(record))
    }

    /// Compiles (or returns the memoized) array record type of `length`
    /// elements of `element`.
    pub fn define_array(&self, element: impl Into<DataType>, length: usize) -> Result<Arc<RecordType>> {
        let accessor = self.resolve(&element.into())?;
        let key = (accessor.name(), length);

        let mut arrays = self.arrays.lock();
        if let Some(record) = arrays.get(&key) {
            trace!("array record {} memo hit", record.name());
            return Ok(record.clone());
        }

        let encoder = self.text_encoder();
        let record = Arc::new(array::compile(accessor, length, encoder.as_ref())?);

        debug!(
            "compiled array record {} uid={} bits={}",
            record.name(),
            record.uid(),
            record.bit_length()
        );

        arrays.insert(key, record.clone());
        Ok(record)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("encoder", &*self.encoder.read())
            .field("arrays", &self.array_cache_len())
            .finish()
    }
}
