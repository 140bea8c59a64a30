use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct AddCommentRequest {
    #[serde(default)]
    pub meal: String,
    #[serde(default)]
    pub comment: String,
}

impl AddCommentRequest {
    /// Trimmed `(meal, comment)`, or the message to show when either is missing.
    pub fn validated(&self) -> Result<(&str, &str), &'static str> {
        let meal = self.meal.trim();
        let comment = self.comment.trim();
        if meal.is_empty() || comment.is_empty() {
            return Err("Please select a meal and write a comment.");
        }
        Ok((meal, comment))
    }
}

#[derive(Debug, Serialize)]
pub struct AddCommentResponse {
    pub success: bool,
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct CommentFilter {
    pub meal: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_are_rejected() {
        let req = AddCommentRequest { meal: "lunch".into(), comment: "   ".into() };
        assert!(req.validated().is_err());
        let req = AddCommentRequest { meal: "".into(), comment: "great dal".into() };
        assert!(req.validated().is_err());
    }

    #[test]
    fn fields_are_trimmed() {
        let req = AddCommentRequest { meal: " lunch ".into(), comment: " great dal\n".into() };
        assert_eq!(req.validated(), Ok(("lunch", "great dal")));
    }
}
