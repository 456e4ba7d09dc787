use serde::Serialize;
use structmirror::{
    upsert, Context, Decode, DecodeResult, Encode, EncodeResult, EntityDescription, FieldMap,
    FieldReader, Model, RecordHandle, ScalarKind, Value,
};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Comment {
    pub identifier: String,
    pub text: String,
    pub discussion_id: Option<String>,
}

impl Comment {
    pub fn new(identifier: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            text: text.into(),
            discussion_id: Some("D1".into()),
        }
    }
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

impl Encode for Comment {
    fn encode(&self, context: &Context) -> EncodeResult<RecordHandle> {
        let mut fields = FieldMap::new();
        fields.insert("text".into(), Value::from(self.text.as_str()));
        fields.insert("discussionID".into(), Value::from(self.discussion_id.clone()));
        upsert(context, "Comment", "id", self.identifier.as_str(), fields)
    }
}

pub fn model() -> Model {
    Model::new().with_entity(
        EntityDescription::new("Comment")
            .attribute("id", ScalarKind::String)
            .attribute("text", ScalarKind::String)
            .attribute("discussionID", ScalarKind::String),
    )
}
