//! Post entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use quill_core::domain::Post;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub author_id: Uuid,
    #[sea_orm(column_type = "Text", nullable)]
    pub author_name: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub excerpt: Option<String>,
    pub published: bool,
    pub verification_requested: bool,
    pub verified: bool,
    pub verified_at: Option<DateTimeWithTimeZone>,
    #[sea_orm(column_type = "Text", nullable)]
    pub background_image_url: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: Json,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Tags are stored as a JSON array of strings.
pub(crate) fn tags_to_json(tags: Vec<String>) -> Json {
    Json::Array(tags.into_iter().map(Json::String).collect())
}

fn tags_from_json(value: Json) -> Vec<String> {
    match value {
        Json::Array(items) => items
            .into_iter()
            .filter_map(|v| match v {
                Json::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Conversion from SeaORM Model to Domain Post.
impl From<Model> for Post {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            author_id: model.author_id,
            author_name: model.author_name,
            title: model.title,
            content: model.content,
            excerpt: model.excerpt,
            published: model.published,
            verification_requested: model.verification_requested,
            verified: model.verified,
            verified_at: model.verified_at.map(Into::into),
            background_image_url: model.background_image_url,
            tags: tags_from_json(model.tags),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

/// Conversion from Domain Post to SeaORM ActiveModel.
impl From<Post> for ActiveModel {
    fn from(post: Post) -> Self {
        Self {
            id: Set(post.id),
            author_id: Set(post.author_id),
            author_name: Set(post.author_name),
            title: Set(post.title),
            content: Set(post.content),
            excerpt: Set(post.excerpt),
            published: Set(post.published),
            verification_requested: Set(post.verification_requested),
            verified: Set(post.verified),
            verified_at: Set(post.verified_at.map(Into::into)),
            background_image_url: Set(post.background_image_url),
            tags: Set(tags_to_json(post.tags)),
            created_at: Set(post.created_at.into()),
            updated_at: Set(post.updated_at.into()),
        }
    }
}
