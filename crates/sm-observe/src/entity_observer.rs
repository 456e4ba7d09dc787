//! Observation of whichever record of an entity carries a given key.

use std::sync::Arc;

use sm_codec::{Decode, DecodeError};
use sm_context::{ChangeNotifier, Context, ContextError};
use sm_types::ScalarValue;
use tracing::debug;

use crate::config::ObserverConfig;
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::filter::ChangeFilter;
use crate::sink::EventSink;
use crate::target::WatchTarget;
use crate::ObserverState;

/// Watches the record of `entity` whose `key` field equals a value.
///
/// Matching is re-evaluated against each batch, so the observer follows
/// whichever record carries the key at the time. Nothing is cached.
pub struct EntityObserver<T> {
    entity: String,
    key: String,
    value: ScalarValue,
    dispatcher: Arc<Dispatcher<T>>,
    filter: ChangeFilter,
}

impl<T> EntityObserver<T>
where
    T: Decode + 'static,
{
    pub fn new<N>(
        entity: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<ScalarValue>,
        notifier: &N,
    ) -> Result<Self>
    where
        N: ChangeNotifier + ?Sized,
    {
        Self::with_config(entity, key, value, notifier, ObserverConfig::default())
    }

    pub fn with_config<N>(
        entity: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<ScalarValue>,
        notifier: &N,
        config: ObserverConfig,
    ) -> Result<Self>
    where
        N: ChangeNotifier + ?Sized,
    {
        let (entity, key, value) = (entity.into(), key.into(), value.into());
        let target = WatchTarget::field(entity.clone(), key.clone(), value.clone());
        let order = config.inspection_order();
        let dispatcher = Arc::new(Dispatcher::new(target.to_string(), config));

        let handler = Arc::clone(&dispatcher);
        let filter = ChangeFilter::subscribe(notifier, target, order, move |found| {
            handler.handle(found)
        })?;
        debug!(observer = %dispatcher.label(), "entity observer started");

        Ok(Self {
            entity,
            key,
            value,
            dispatcher,
            filter,
        })
    }

    /// Decode the record that currently carries the key, if any.
    ///
    /// An unknown entity or key field means there is nothing to find and
    /// yields `Ok(None)`.
    pub fn fetch_current(&self, context: &Context) -> Result<Option<T>> {
        match context.find_first(&self.entity, &self.key, &self.value) {
            Ok(Some(record)) => Ok(Some(T::decode(&record)?)),
            Ok(None) => Ok(None),
            Err(ContextError::FieldNotFound { .. } | ContextError::UnknownEntity(_)) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

impl<T> EntityObserver<T> {
    pub fn entity_name(&self) -> &str {
        &self.entity
    }

    /// The `(key, value)` pair records are matched on.
    pub fn identifier(&self) -> (&str, &ScalarValue) {
        (&self.key, &self.value)
    }

    pub fn target(&self) -> &WatchTarget {
        self.filter.target()
    }

    /// Replace every callback slot at once.
    pub fn set_event_sink(&self, sink: EventSink<T>) {
        self.dispatcher.set_sink(sink);
    }

    pub fn set_on_updated(&self, f: impl Fn(&T) + Send + Sync + 'static) {
        self.dispatcher.update_sink(|sink| sink.updated = Some(Arc::new(f)));
    }

    pub fn set_on_inserted(&self, f: impl Fn(&T) + Send + Sync + 'static) {
        self.dispatcher.update_sink(|sink| sink.inserted = Some(Arc::new(f)));
    }

    pub fn set_on_deleted(&self, f: impl Fn() + Send + Sync + 'static) {
        self.dispatcher.update_sink(|sink| sink.deleted = Some(Arc::new(f)));
    }

    pub fn set_on_decode_error(&self, f: impl Fn(&DecodeError) + Send + Sync + 'static) {
        self.dispatcher.update_sink(|sink| sink.decode_error = Some(Arc::new(f)));
    }

    pub fn state(&self) -> ObserverState {
        if self.filter.is_active() {
            ObserverState::Active
        } else {
            ObserverState::TornDown
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() == ObserverState::Active
    }

    /// Stop observing. Returns `true` on the call that tore the observer
    /// down.
    pub fn close(&self) -> bool {
        let closed = self.filter.unsubscribe();
        if closed {
            debug!(observer = %self.dispatcher.label(), "entity observer closed");
        }
        closed
    }
}

impl<T> Drop for EntityObserver<T> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<T> std::fmt::Debug for EntityObserver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityObserver")
            .field("target", self.target())
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{comment, context, insert_comment, insert_discussion, Comment, Recorder, Seen};
    use sm_context::{ChangeBatch, ContextConfig, EntityDescription, Model};
    use sm_types::{FieldMap, ScalarKind, Value};

    fn observe(ctx: &Context, id: &str) -> (EntityObserver<Comment>, Recorder) {
        let observer = EntityObserver::new("Comment", "id", id, ctx).unwrap();
        let recorder = Recorder::new();
        observer.set_event_sink(recorder.sink());
        (observer, recorder)
    }

    #[test]
    fn accessors_report_target() {
        let ctx = context();
        let (observer, _) = observe(&ctx, "C1");
        assert_eq!(observer.entity_name(), "Comment");
        assert_eq!(observer.identifier(), ("id", &ScalarValue::from("C1")));
        assert_eq!(observer.target().to_string(), "Comment[id == \"C1\"]");
        assert!(observer.is_active());
    }

    #[test]
    fn update_of_matching_record_is_delivered() {
        let ctx = context();
        let r = insert_comment(&ctx, "C1", "hello");
        ctx.save().unwrap();
        let (_observer, recorder) = observe(&ctx, "C1");

        ctx.set(&r, "text", "edited").unwrap();
        ctx.save().unwrap();

        assert_eq!(recorder.events(), vec![Seen::Updated(comment("C1", "edited"))]);
    }

    #[test]
    fn insert_of_matching_record_is_delivered() {
        let ctx = context();
        let (_observer, recorder) = observe(&ctx, "C1");

        insert_comment(&ctx, "C1", "hello");
        ctx.save().unwrap();

        assert_eq!(recorder.events(), vec![Seen::Inserted(comment("C1", "hello"))]);
    }

    #[test]
    fn follows_whichever_record_carries_the_key() {
        let ctx = context();
        let first = insert_comment(&ctx, "C1", "first");
        let second = insert_comment(&ctx, "C2", "second");
        ctx.save().unwrap();
        let (_observer, recorder) = observe(&ctx, "C1");

        ctx.set(&first, "text", "first edited").unwrap();
        ctx.save().unwrap();

        ctx.set(&first, "id", "C0").unwrap();
        ctx.set(&second, "id", "C1").unwrap();
        ctx.save().unwrap();

        assert_eq!(
            recorder.events(),
            vec![
                Seen::Updated(comment("C1", "first edited")),
                Seen::Updated(comment("C1", "second")),
            ]
        );
    }

    #[test]
    fn deleted_matching_record_fires_deleted() {
        let ctx = context();
        let r = insert_comment(&ctx, "C1", "hello");
        ctx.save().unwrap();
        let (_observer, recorder) = observe(&ctx, "C1");

        ctx.delete(&r).unwrap();
        ctx.save().unwrap();

        assert_eq!(recorder.events(), vec![Seen::Deleted]);
    }

    #[test]
    fn comment_c1_updated_batch() {
        let ctx = context();
        let r = insert_comment(&ctx, "C1", "hello");
        let (_observer, recorder) = observe(&ctx, "C1");

        ctx.feed().publish(&ChangeBatch::new().with_updated([r]));

        assert_eq!(recorder.events(), vec![Seen::Updated(comment("C1", "hello"))]);
    }

    #[test]
    fn two_batches_naming_two_records() {
        let ctx = context();
        let a = insert_comment(&ctx, "C1", "from a");
        let b = insert_comment(&ctx, "C2", "from b");
        let (_observer, recorder) = observe(&ctx, "C1");

        ctx.feed().publish(&ChangeBatch::new().with_updated([a.clone()]));
        ctx.set(&a, "id", "C9").unwrap();
        ctx.set(&b, "id", "C1").unwrap();
        ctx.feed().publish(&ChangeBatch::new().with_updated([b]));

        assert_eq!(
            recorder.events(),
            vec![
                Seen::Updated(comment("C1", "from a")),
                Seen::Updated(comment("C1", "from b")),
            ]
        );
    }

    #[test]
    fn other_entities_and_keys_are_ignored() {
        let ctx = context();
        let other = insert_comment(&ctx, "C2", "other");
        let discussion = insert_discussion(&ctx, "C1");
        ctx.save().unwrap();
        let (_observer, recorder) = observe(&ctx, "C1");

        ctx.set(&other, "text", "changed").unwrap();
        ctx.set(&discussion, "subject", "same id, wrong entity").unwrap();
        ctx.save().unwrap();

        assert!(recorder.events().is_empty());
    }

    #[test]
    fn missing_key_field_never_matches() {
        let ctx = context();
        let r = insert_comment(&ctx, "C1", "hello");
        ctx.save().unwrap();
        let observer: EntityObserver<Comment> =
            EntityObserver::new("Comment", "slug", "C1", &ctx).unwrap();
        let recorder = Recorder::new();
        observer.set_event_sink(recorder.sink());

        ctx.set(&r, "text", "edited").unwrap();
        ctx.save().unwrap();

        assert!(recorder.events().is_empty());
        assert_eq!(observer.fetch_current(&ctx).unwrap(), None);
    }

    #[test]
    fn first_matching_record_wins() {
        let ctx = context();
        let a = insert_comment(&ctx, "C1", "a");
        let b = insert_comment(&ctx, "C1", "b");
        let (_observer, recorder) = observe(&ctx, "C1");

        ctx.feed()
            .publish(&ChangeBatch::new().with_updated([a.clone(), b.clone()]));

        let events = recorder.events();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], Seen::Updated(c) if c.identifier == "C1"));
    }

    #[test]
    fn fetch_current_decodes_live_record() {
        let ctx = context();
        let (observer, _) = observe(&ctx, "C1");
        assert_eq!(observer.fetch_current(&ctx).unwrap(), None);

        insert_comment(&ctx, "C1", "hello");
        assert_eq!(observer.fetch_current(&ctx).unwrap(), Some(comment("C1", "hello")));
    }

    #[test]
    fn fetch_current_on_unknown_entity_is_none() {
        let ctx = context();
        let observer: EntityObserver<Comment> =
            EntityObserver::new("Attachment", "id", "A1", &ctx).unwrap();
        assert_eq!(observer.fetch_current(&ctx).unwrap(), None);
    }

    #[test]
    fn decode_failure_is_reported() {
        let ctx = context();
        let mut fields = FieldMap::new();
        fields.insert("id".into(), Value::from("C1"));
        let (_observer, recorder) = observe(&ctx, "C1");

        ctx.insert("Comment", fields).unwrap();
        ctx.save().unwrap();

        let events = recorder.events();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], Seen::DecodeFailed(_)));
    }

    #[test]
    fn integer_keys_match_by_value() {
        let model = Model::new().with_entity(
            EntityDescription::new("Ticket")
                .attribute("number", ScalarKind::Integer)
                .attribute("title", ScalarKind::String),
        );
        let ctx = Context::new(model, ContextConfig::default());
        let observer: EntityObserver<Comment> =
            EntityObserver::new("Ticket", "number", 7i64, &ctx).unwrap();
        let failures = Recorder::new();
        observer.set_event_sink(failures.sink());

        let mut fields = FieldMap::new();
        fields.insert("number".into(), Value::from(7i64));
        ctx.insert("Ticket", fields).unwrap();
        ctx.save().unwrap();

        // A Ticket is not a Comment, so the match surfaces as a decode error.
        assert!(matches!(
            failures.events().as_slice(),
            [Seen::DecodeFailed(sm_codec::DecodeError::WrongEntity { .. })]
        ));
    }

    #[test]
    fn close_stops_delivery() {
        let ctx = context();
        let r = insert_comment(&ctx, "C1", "hello");
        ctx.save().unwrap();
        let (observer, recorder) = observe(&ctx, "C1");

        assert!(observer.close());
        assert!(!observer.close());
        assert_eq!(observer.state(), ObserverState::TornDown);

        ctx.set(&r, "text", "edited").unwrap();
        ctx.save().unwrap();
        assert!(recorder.events().is_empty());
    }

    #[test]
    fn invalidated_context_refuses_observer() {
        let ctx = context();
        ctx.invalidate();
        let err = EntityObserver::<Comment>::new("Comment", "id", "C1", &ctx).unwrap_err();
        assert!(matches!(err, crate::ObserveError::Context(ContextError::Invalidated(_))));
    }
}
