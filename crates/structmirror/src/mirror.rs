use sm_codec::{decode_all, Decode, Encode};
use sm_context::{Context, Model, RecordHandle};
use sm_observe::{EntityObserver, RecordObserver};
use sm_types::ScalarValue;
use tracing::info;

use crate::config::MirrorConfig;
use crate::error::MirrorResult;

/// An in-memory context together with the settings used for the observers
/// created on it.
pub struct Mirror {
    context: Context,
    config: MirrorConfig,
}

impl Mirror {
    /// Open a mirror over `model` with default settings.
    pub fn open(model: Model) -> Self {
        Self::with_config(model, MirrorConfig::default())
    }

    pub fn with_config(model: Model, config: MirrorConfig) -> Self {
        let context = Context::new(model, config.context.clone());
        info!(context = %context.id(), name = %config.context.name, "mirror opened");
        Self { context, config }
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    // ---- Values ----

    /// Write `value` into the context.
    pub fn store<E: Encode>(&self, value: &E) -> MirrorResult<RecordHandle> {
        Ok(value.encode(&self.context)?)
    }

    /// Decode every live record of `entity`, in insertion order.
    pub fn load_all<T: Decode>(&self, entity: &str) -> MirrorResult<Vec<T>> {
        let records = self.context.fetch(entity)?;
        Ok(decode_all(&records)?)
    }

    /// Decode the first record of `entity` whose `key` equals `value`.
    pub fn load<T: Decode>(
        &self,
        entity: &str,
        key: &str,
        value: impl Into<ScalarValue>,
    ) -> MirrorResult<Option<T>> {
        match self.context.find_first(entity, key, &value.into())? {
            Some(record) => Ok(Some(T::decode(&record)?)),
            None => Ok(None),
        }
    }

    /// Publish pending changes. Returns the number of records touched.
    pub fn save(&self) -> MirrorResult<usize> {
        Ok(self.context.save()?)
    }

    // ---- Observers ----

    pub fn observe_record<T>(&self, record: RecordHandle) -> MirrorResult<RecordObserver<T>>
    where
        T: Decode + Clone + Send + Sync + 'static,
    {
        Ok(RecordObserver::with_config(
            record,
            &self.context,
            self.config.observer.clone(),
        )?)
    }

    pub fn observe_entity<T>(
        &self,
        entity: &str,
        key: &str,
        value: impl Into<ScalarValue>,
    ) -> MirrorResult<EntityObserver<T>>
    where
        T: Decode + 'static,
    {
        Ok(EntityObserver::with_config(
            entity,
            key,
            value,
            &self.context,
            self.config.observer.clone(),
        )?)
    }
}

impl std::fmt::Debug for Mirror {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mirror")
            .field("context", &self.context.id())
            .field("config", &self.config)
            .finish()
    }
}
