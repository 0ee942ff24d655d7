use mongodb::bson::{self, DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{AnswerEntity, AnswerEntryEntity, QuestionEntity, UserEntity};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoQuestionDocument {
    #[serde(rename = "_id")]
    id: bson::Uuid,
    author_id: bson::Uuid,
    text: String,
    correct_answer_id: Option<bson::Uuid>,
    created_at: DateTime,
    activated_at: Option<DateTime>,
}

impl From<QuestionEntity> for MongoQuestionDocument {
    fn from(value: QuestionEntity) -> Self {
        Self {
            id: to_bson_uuid(value.id),
            author_id: to_bson_uuid(value.author_id),
            text: value.text,
            correct_answer_id: value.correct_answer_id.map(to_bson_uuid),
            created_at: DateTime::from_system_time(value.created_at),
            activated_at: value.activated_at.map(DateTime::from_system_time),
        }
    }
}

impl From<MongoQuestionDocument> for QuestionEntity {
    fn from(value: MongoQuestionDocument) -> Self {
        Self {
            id: from_bson_uuid(value.id),
            author_id: from_bson_uuid(value.author_id),
            text: value.text,
            correct_answer_id: value.correct_answer_id.map(from_bson_uuid),
            created_at: value.created_at.to_system_time(),
            activated_at: value.activated_at.map(|at| at.to_system_time()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoAnswerDocument {
    #[serde(rename = "_id")]
    id: bson::Uuid,
    question_id: bson::Uuid,
    position: i32,
    text: String,
}

impl From<AnswerEntity> for MongoAnswerDocument {
    fn from(value: AnswerEntity) -> Self {
        Self {
            id: to_bson_uuid(value.id),
            question_id: to_bson_uuid(value.question_id),
            position: i32::from(value.position),
            text: value.text,
        }
    }
}

impl From<MongoAnswerDocument> for AnswerEntity {
    fn from(value: MongoAnswerDocument) -> Self {
        Self {
            id: from_bson_uuid(value.id),
            question_id: from_bson_uuid(value.question_id),
            position: u8::try_from(value.position).unwrap_or(u8::MAX),
            text: value.text,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoAnswerEntryDocument {
    #[serde(rename = "_id")]
    id: bson::Uuid,
    user_id: bson::Uuid,
    question_id: bson::Uuid,
    answer_id: bson::Uuid,
    updated_at: DateTime,
}

impl From<MongoAnswerEntryDocument> for AnswerEntryEntity {
    fn from(value: MongoAnswerEntryDocument) -> Self {
        Self {
            id: from_bson_uuid(value.id),
            user_id: from_bson_uuid(value.user_id),
            question_id: from_bson_uuid(value.question_id),
            answer_id: from_bson_uuid(value.answer_id),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoUserDocument {
    #[serde(rename = "_id")]
    id: bson::Uuid,
    external_id: String,
    display_name: String,
    image_url: Option<String>,
    points: i64,
    created_at: DateTime,
}

impl From<MongoUserDocument> for UserEntity {
    fn from(value: MongoUserDocument) -> Self {
        Self {
            id: from_bson_uuid(value.id),
            external_id: value.external_id,
            display_name: value.display_name,
            image_url: value.image_url,
            points: u64::try_from(value.points).unwrap_or(0),
            created_at: value.created_at.to_system_time(),
        }
    }
}

pub fn to_bson_uuid(id: Uuid) -> bson::Uuid {
    bson::Uuid::from_bytes(id.into_bytes())
}

fn from_bson_uuid(id: bson::Uuid) -> Uuid {
    Uuid::from_bytes(id.bytes())
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": to_bson_uuid(id)}
}
