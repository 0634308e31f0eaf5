use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CommentId, JobId};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Comment {
    /// Assigned by the record store on insertion.
    pub id: CommentId,
    pub job_id: JobId,
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Tags are short free-form labels; surrounding whitespace is dropped and empty tags rejected.
pub fn normalize_tags<S: AsRef<str>>(tags: &[S]) -> crate::Result<Vec<String>> {
    let mut result: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.as_ref().trim();
        if tag.is_empty() {
            return crate::common::error::validation_error("Tags cannot be empty".to_string());
        }
        if !result.iter().any(|t| t == tag) {
            result.push(tag.to_string());
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::normalize_tags;

    #[test]
    fn test_normalize_tags() {
        assert_eq!(
            normalize_tags(&[" a", "b ", "a"]).unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );
        assert!(normalize_tags(&["a", "  "]).is_err());
    }
}
