//! Shared test fixtures: a small comment/discussion model and an event
//! recorder.

use std::sync::{Arc, Mutex};

use sm_codec::{Decode, DecodeError, DecodeResult, FieldReader};
use sm_context::{Context, ContextConfig, EntityDescription, Model, RecordHandle};
use sm_types::{FieldMap, ScalarKind, Value};

use crate::sink::EventSink;

#[derive(Clone, Debug, PartialEq)]
pub struct Comment {
    pub identifier: String,
    pub text: String,
    pub discussion_id: Option<String>,
}

impl Decode for Comment {
    fn decode(record: &RecordHandle) -> DecodeResult<Self> {
        let r = FieldReader::for_entity(record, "Comment")?;
        Ok(Self {
            identifier: r.required_string("id")?,
            text: r.required_string("text")?,
            discussion_id: r.optional_string("discussionID")?,
        })
    }
}

pub fn model() -> Model {
    Model::new()
        .with_entity(
            EntityDescription::new("Comment")
                .attribute("id", ScalarKind::String)
                .attribute("text", ScalarKind::String)
                .attribute("discussionID", ScalarKind::String),
        )
        .with_entity(
            EntityDescription::new("Discussion")
                .attribute("id", ScalarKind::String)
                .attribute("subject", ScalarKind::String),
        )
}

pub fn context() -> Context {
    Context::new(model(), ContextConfig::default())
}

pub fn insert_comment(ctx: &Context, id: &str, text: &str) -> RecordHandle {
    let mut fields = FieldMap::new();
    fields.insert("id".into(), Value::from(id));
    fields.insert("text".into(), Value::from(text));
    ctx.insert("Comment", fields).unwrap()
}

pub fn insert_discussion(ctx: &Context, id: &str) -> RecordHandle {
    let mut fields = FieldMap::new();
    fields.insert("id".into(), Value::from(id));
    ctx.insert("Discussion", fields).unwrap()
}

pub fn comment(id: &str, text: &str) -> Comment {
    Comment {
        identifier: id.into(),
        text: text.into(),
        discussion_id: None,
    }
}

/// One callback invocation, as seen by a [`Recorder`].
#[derive(Clone, Debug, PartialEq)]
pub enum Seen {
    Inserted(Comment),
    Updated(Comment),
    Deleted,
    DecodeFailed(DecodeError),
}

/// Collects every callback invocation of the sinks it hands out.
#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<Seen>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sink(&self) -> EventSink<Comment> {
        let (i, u, d, e) = (
            Arc::clone(&self.events),
            Arc::clone(&self.events),
            Arc::clone(&self.events),
            Arc::clone(&self.events),
        );
        EventSink::new()
            .on_inserted(move |c: &Comment| i.lock().unwrap().push(Seen::Inserted(c.clone())))
            .on_updated(move |c: &Comment| u.lock().unwrap().push(Seen::Updated(c.clone())))
            .on_deleted(move || d.lock().unwrap().push(Seen::Deleted))
            .on_decode_error(move |err: &DecodeError| {
                e.lock().unwrap().push(Seen::DecodeFailed(err.clone()))
            })
    }

    pub fn events(&self) -> Vec<Seen> {
        self.events.lock().unwrap().clone()
    }
}
