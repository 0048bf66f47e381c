//! Post entity and its GraphQL input types

use async_graphql::{InputObject, SimpleObject};
use serde::{Deserialize, Serialize};

use crate::types::DateTime;

/// Identifier assigned to a post by the persistence layer
pub type PostId = i32;

/// Post entity
#[derive(SimpleObject, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub body: String,
    pub created_at: DateTime,
}

/// Fields supplied when creating a post
#[derive(InputObject, Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePostInput {
    pub title: String,
    pub body: String,
}

/// Fields supplied when updating a post
///
/// Absent fields keep their current value.
#[derive(InputObject, Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePostInput {
    pub title: Option<String>,
    pub body: Option<String>,
}

impl UpdatePostInput {
    /// Apply the present fields onto `post`, leaving `id` and `created_at` untouched
    pub fn apply_to(&self, post: &mut Post) {
        if let Some(title) = &self.title {
            post.title = title.clone();
        }
        if let Some(body) = &self.body {
            post.body = body.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Post {
        Post {
            id: 7,
            title: "A".to_string(),
            body: "first".to_string(),
            created_at: DateTime::now(),
        }
    }

    #[test]
    fn test_apply_partial_update() {
        let mut post = sample();
        let before = post.clone();

        let input = UpdatePostInput {
            title: Some("B".to_string()),
            body: None,
        };
        input.apply_to(&mut post);

        assert_eq!(post.title, "B");
        assert_eq!(post.body, before.body);
        assert_eq!(post.id, before.id);
        assert_eq!(post.created_at, before.created_at);
    }

    #[test]
    fn test_empty_update_is_noop() {
        let mut post = sample();
        let before = post.clone();
        let input = UpdatePostInput::default();

        input.apply_to(&mut post);
        assert_eq!(post, before);
    }
}
